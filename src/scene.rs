pub(crate) mod exclusion;
pub(crate) mod list;
pub(crate) mod reference;
