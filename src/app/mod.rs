//! Application orchestration module

pub mod initialization;
pub mod execution;

pub use initialization::{
    load_configuration,
    configure_logging,
    create_colour_manager,
    open_service,
};
pub use execution::execute;
