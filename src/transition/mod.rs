pub(crate) mod instance;
pub(crate) mod settings;
pub(crate) mod uniforms;
