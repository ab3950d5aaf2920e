//! Usage example synthesis
//!
//! Fabricates a plausible call for a recognized symbol. Argument values are
//! picked from the parameter *name* alone; types are never consulted.

use crate::analysis::record::SymbolRecord;
use crate::language::{Language, LanguageFamily};

/// Where a value rule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleScope {
    Both,
    CallOnly,
    ComponentOnly,
}

/// Name fragments mapped to a placeholder value, first hit wins
const VALUE_RULES: &[(&[&str], &str, RuleScope)] = &[
    (&["id", "Id"], "123", RuleScope::Both),
    (&["name", "Name"], "\"example\"", RuleScope::CallOnly),
    (&["count", "num"], "10", RuleScope::Both),
    (&["flag", "is"], "true", RuleScope::Both),
    (&["Batch"], "true", RuleScope::ComponentOnly),
    (&["data", "list", "items"], "[]", RuleScope::Both),
    (&["config", "options"], "{}", RuleScope::Both),
    (&["on", "handle", "callback"], "() => {}", RuleScope::ComponentOnly),
    (&["style", "className"], "\"\"", RuleScope::ComponentOnly),
];

const DEFAULT_VALUE: &str = "\"value\"";
const CHILDREN_PROP: &str = "children";

/// Placeholder literal for a parameter called `name`
pub fn placeholder_value(name: &str, component: bool) -> &'static str {
    VALUE_RULES
        .iter()
        .filter(|(_, _, scope)| match scope {
            RuleScope::Both => true,
            RuleScope::CallOnly => !component,
            RuleScope::ComponentOnly => component,
        })
        .find(|(fragments, _, _)| fragments.iter().any(|fragment| name.contains(fragment)))
        .map(|(_, value, _)| *value)
        .unwrap_or(DEFAULT_VALUE)
}

/// Bare name of a raw parameter: annotation and default dropped, `?` stripped
pub fn parameter_name(raw: &str) -> &str {
    let head = raw.split([':', '=']).next().unwrap_or_default().trim();
    head.strip_suffix('?').unwrap_or(head).trim_end()
}

/// Component-like symbols: capitalized names in a JSX-capable language
pub fn is_component(record: &SymbolRecord) -> bool {
    record.language().supports_components()
        && record.name().chars().next().is_some_and(char::is_uppercase)
}

/// Synthesize a call (or markup block for components) for `record`
pub fn synthesize(record: &SymbolRecord) -> String {
    if is_component(record) {
        return component_example(record.name(), record.parameters());
    }

    let args = record
        .parameters()
        .iter()
        .map(|param| placeholder_value(parameter_name(param), false))
        .collect::<Vec<_>>()
        .join(", ");

    format_call(record.name(), &args, record.return_type(), record.language())
}

fn has_result(return_type: &str, language: &Language) -> bool {
    !language.is_void_like(return_type)
}

fn format_call(name: &str, args: &str, return_type: &str, language: &Language) -> String {
    if !language.is_recognized() {
        return format!("{name}({args});");
    }

    let with_result = has_result(return_type, language);
    match language.family() {
        LanguageFamily::TypeScript | LanguageFamily::JavaScript if with_result => {
            format!("const result = {name}({args});")
        }
        LanguageFamily::TypeScript | LanguageFamily::JavaScript => format!("{name}({args});"),
        LanguageFamily::Python if with_result => format!("result = {name}({args})"),
        LanguageFamily::Python => format!("{name}({args})"),
        LanguageFamily::Java if with_result => format!("{return_type} result = {name}({args});"),
        LanguageFamily::Java => format!("{name}({args});"),
    }
}

/// Prop names from a flat list or a single destructured `{ a, b }` parameter
fn prop_names(parameters: &[String]) -> Vec<String> {
    let mut names = Vec::new();
    for param in parameters {
        let param = param.trim();
        if let Some(inner) = param.strip_prefix('{') {
            let inner = inner.split('}').next().unwrap_or_default();
            names.extend(
                inner
                    .split(',')
                    .map(parameter_name)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string),
            );
        } else {
            let name = parameter_name(param);
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
    }
    names
}

fn component_example(name: &str, parameters: &[String]) -> String {
    let names = prop_names(parameters);
    let has_children = names.iter().any(|prop| prop == CHILDREN_PROP);

    let props = names
        .iter()
        .filter(|prop| *prop != CHILDREN_PROP)
        .map(|prop| format!("{prop}={{{}}}", placeholder_value(prop, true)))
        .collect::<Vec<_>>()
        .join("\n  ");

    match (has_children, props.is_empty()) {
        (true, false) => format!("<{name}\n  {props}\n>\n  {{/* children content */}}\n</{name}>"),
        (true, true) => format!("<{name}>\n  {{/* children content */}}\n</{name}>"),
        (false, false) => format!("<{name}\n  {props}\n/>"),
        (false, true) => format!("<{name} />"),
    }
}
