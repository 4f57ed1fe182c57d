//! Provider definitions: the declarative description of one remote action.
//!
//! - `model`: schema, validation and the ordered argument/header map
//! - `placeholder`: `$input$` / `$random$` resolution before a request is sent
//! - `registry`: loading a directory of definitions and grouping them for menus

pub mod model;
pub mod placeholder;
pub mod registry;

pub use model::{
    MenuGroup, OrderedMap, Provider, ProviderError, ProviderFile, RequestType, parse_provider,
};
pub use placeholder::InputPrompt;
pub use registry::{ProviderRegistry, SkippedProvider};
