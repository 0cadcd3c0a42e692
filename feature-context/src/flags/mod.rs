pub mod features;
pub mod flag_models;
pub mod overrides;
pub mod projection;
