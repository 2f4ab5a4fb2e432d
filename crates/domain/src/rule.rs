//! Rule — automation rules assembled from trigger, condition, and action
//! modules.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::configuration::Configuration;
use crate::error::{HearthError, ValidationError};
use crate::id::RuleUid;
use crate::rule::status::TemplateState;

pub mod status;

/// One building block of a rule.
///
/// The `type_uid` names the module type a handler is looked up by; the
/// configuration carries whatever that type needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    #[serde(rename = "type")]
    pub type_uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub configuration: Configuration,
}

impl Module {
    #[must_use]
    pub fn new(id: impl Into<String>, type_uid: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_uid: type_uid.into(),
            label: None,
            configuration: Configuration::default(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }
}

/// Who gets to see a rule in user interfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Expert,
}

/// An automation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub uid: RuleUid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: HashSet<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub configuration: Configuration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_uid: Option<String>,
    #[serde(default)]
    pub template_state: TemplateState,
    #[serde(default)]
    pub triggers: Vec<Module>,
    #[serde(default)]
    pub conditions: Vec<Module>,
    #[serde(default)]
    pub actions: Vec<Module>,
}

impl Rule {
    #[must_use]
    pub fn builder(uid: impl Into<RuleUid>) -> RuleBuilder {
        RuleBuilder {
            uid: uid.into(),
            ..RuleBuilder::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct RuleBuilder {
    uid: RuleUid,
    name: Option<String>,
    description: Option<String>,
    tags: HashSet<String>,
    visibility: Visibility,
    configuration: Configuration,
    template_uid: Option<String>,
    template_state: TemplateState,
    triggers: Vec<Module>,
    conditions: Vec<Module>,
    actions: Vec<Module>,
}

impl RuleBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Mark the rule as created from a template; instantiation is pending
    /// until the template's modules have been merged in.
    #[must_use]
    pub fn template(mut self, template_uid: impl Into<String>) -> Self {
        self.template_uid = Some(template_uid.into());
        self.template_state = TemplateState::Pending;
        self
    }

    #[must_use]
    pub fn template_state(mut self, state: TemplateState) -> Self {
        self.template_state = state;
        self
    }

    #[must_use]
    pub fn trigger(mut self, module: Module) -> Self {
        self.triggers.push(module);
        self
    }

    #[must_use]
    pub fn condition(mut self, module: Module) -> Self {
        self.conditions.push(module);
        self
    }

    #[must_use]
    pub fn action(mut self, module: Module) -> Self {
        self.actions.push(module);
        self
    }

    /// # Errors
    ///
    /// [`ValidationError::EmptyRuleUid`] when the uid is blank.
    pub fn build(self) -> Result<Rule, HearthError> {
        if self.uid.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyRuleUid.into());
        }
        Ok(Rule {
            uid: self.uid,
            name: self.name,
            description: self.description,
            tags: self.tags,
            visibility: self.visibility,
            configuration: self.configuration,
            template_uid: self.template_uid,
            template_state: self.template_state,
            triggers: self.triggers,
            conditions: self.conditions,
            actions: self.actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_rule_with_modules() {
        let rule = Rule::builder("lamp-off-on-presence")
            .name("Lamp off")
            .tag("presence")
            .trigger(Module::new("1", "hearth.ThingStatusChangeTrigger"))
            .action(Module::new("2", "hearth.LogAction"))
            .build()
            .unwrap();
        assert_eq!(rule.uid, RuleUid::from("lamp-off-on-presence"));
        assert_eq!(rule.visibility, Visibility::Visible);
        assert_eq!(rule.template_state, TemplateState::NoTemplate);
        assert_eq!(rule.triggers.len(), 1);
        assert_eq!(rule.conditions.len(), 0);
        assert_eq!(rule.actions.len(), 1);
    }

    #[test]
    fn should_mark_templated_rules_pending() {
        let rule = Rule::builder("from-template")
            .template("motion-light")
            .build()
            .unwrap();
        assert_eq!(rule.template_uid.as_deref(), Some("motion-light"));
        assert_eq!(rule.template_state, TemplateState::Pending);
    }

    #[test]
    fn should_reject_blank_uid() {
        let err = Rule::builder("  ").build().unwrap_err();
        assert!(matches!(
            err,
            HearthError::Validation(ValidationError::EmptyRuleUid)
        ));
    }
}
