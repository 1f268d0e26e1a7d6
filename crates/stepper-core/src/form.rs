use crate::controller::ActiveStep;
use crate::error::Result;
use crate::registry::StepRegistry;
use serde_json::Value;
use std::collections::HashMap;

/// A form bound to one step.
///
/// `render` receives the payload saved for the step (`Value::Null` when
/// nothing was saved yet) and a handle that can only report progress for,
/// and save data to, that step.
pub trait StepForm {
    fn render(&self, payload: &Value, step: &mut ActiveStep<'_>) -> Result<()>;
}

impl<F> StepForm for F
where
    F: Fn(&Value, &mut ActiveStep<'_>) -> Result<()>,
{
    fn render(&self, payload: &Value, step: &mut ActiveStep<'_>) -> Result<()> {
        self(payload, step)
    }
}

/// Step id to form mapping for one wizard.
#[derive(Default)]
pub struct FormSet {
    forms: HashMap<String, Box<dyn StepForm>>,
}

impl FormSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, step_id: impl Into<String>, form: impl StepForm + 'static) -> Self {
        self.forms.insert(step_id.into(), Box::new(form));
        self
    }

    pub fn get(&self, step_id: &str) -> Option<&dyn StepForm> {
        self.forms.get(step_id).map(|f| f.as_ref())
    }

    /// Steps in `registry` that have no form bound, in ordinal order.
    pub fn unbound<'r>(&self, registry: &'r StepRegistry) -> Vec<&'r str> {
        registry
            .list_steps()
            .iter()
            .filter(|s| !self.forms.contains_key(&s.id))
            .map(|s| s.id.as_str())
            .collect()
    }
}
