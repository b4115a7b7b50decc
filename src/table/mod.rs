pub(crate) mod codec;
pub(crate) mod generate;
pub(crate) mod model;
pub(crate) mod persist;
pub(crate) mod store;
