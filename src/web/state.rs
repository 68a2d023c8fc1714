use std::sync::Arc;

use crate::altitude::SeriesAssembler;
use crate::source::TleSource;

use super::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub source: Arc<dyn TleSource>,
    pub assembler: SeriesAssembler,
}
