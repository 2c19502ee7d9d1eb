pub mod logger;
pub mod settings;

pub mod system;

pub mod application_port;
pub mod application_impl;
pub mod domain_model;
pub mod domain_port;
pub mod infra_file;
pub mod infra_memory;

pub mod gate;

pub mod fake_idp;
