//! Template context: the fixed binding record a job template sees.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use jobwright_core::JobParameters;

use crate::error::RenderError;

/// Binding record exposed to templates as `Name`, `Description`,
/// `DisplayName`, `Disabled` and `Parameters`.
///
/// Absent optional strings bind as empty strings so templates can reference
/// them unconditionally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BindingContext {
    pub name: String,
    pub description: String,
    pub display_name: String,
    pub disabled: bool,
    pub parameters: BTreeMap<String, String>,
}

impl BindingContext {
    pub fn from_parameters(params: &JobParameters) -> Self {
        BindingContext {
            name: params.name.0.clone(),
            description: params.description.clone().unwrap_or_default(),
            display_name: params.display_name.clone().unwrap_or_default(),
            disabled: params.disabled,
            parameters: params.parameters.clone(),
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::TemplateExecution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_names_are_pascal_case() {
        let mut params = JobParameters::new("job1");
        params.parameters.insert("branch".into(), "main".into());
        let ctx = BindingContext::from_parameters(&params);
        let json = serde_json::to_value(&ctx).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["Description", "Disabled", "DisplayName", "Name", "Parameters"]
        );
        assert_eq!(json["Parameters"]["branch"], "main");
    }

    #[test]
    fn absent_strings_bind_empty() {
        let ctx = BindingContext::from_parameters(&JobParameters::new("job1"));
        assert_eq!(ctx.description, "");
        assert_eq!(ctx.display_name, "");
        ctx.to_tera_context().expect("context conversion");
    }
}
