//! Navigate action: asks the UI to show another page, `{"page_id": "..."}`

use super::{param_str, Action, ActionError};
use crate::config::ActionParams;
use std::sync::Arc;
use tracing::warn;

/// Implemented by whatever owns the visible page.
///
/// Unknown ids are the navigator's concern; it ignores them.
pub trait PageNavigator: Send + Sync {
    fn switch_to_page_id(&self, page_id: &str);
}

pub struct NavigatePageAction {
    navigator: Arc<dyn PageNavigator>,
}

impl NavigatePageAction {
    pub fn new(navigator: Arc<dyn PageNavigator>) -> Self {
        Self { navigator }
    }
}

impl Action for NavigatePageAction {
    fn execute(&self, params: &ActionParams) -> Result<(), ActionError> {
        let Some(page_id) = param_str(params, "page_id") else {
            warn!("navigate_page: no page_id specified");
            return Ok(());
        };
        self.navigator.switch_to_page_id(page_id);
        Ok(())
    }
}
