// src/submit/template.rs

//! Submission script templates.
//!
//! `{name}` is replaced with the job config field `name`; `{{` and `}}`
//! produce literal braces. Format specs, conversions and attribute or index
//! access (`{job_pk:05d}`, `{name!r}`, `{input.path}`) are not supported and
//! are rejected rather than left in the script. Other braces (shell groups,
//! function bodies) are copied through unchanged.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::JobConfig;
use crate::errors::{ClustersideError, Result};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)([!:.\[][^{}]*)?\}").expect("valid regex")
});

/// Render `template` against the fields of `cfg`.
pub fn render(template: &str, cfg: &JobConfig) -> Result<String> {
    render_with(template, |name| cfg.field(name))
}

/// Render `template`, resolving each placeholder through `lookup`.
///
/// The first unresolved placeholder is a `ConfigError`.
pub fn render_with<F>(template: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&template[last..whole.start()]);
        out.push_str(&substitute(&caps, &lookup)?);
        last = whole.end();
    }
    out.push_str(&template[last..]);

    Ok(out)
}

fn substitute<F>(caps: &Captures<'_>, lookup: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if caps.get(2).is_some() {
        return Err(ClustersideError::ConfigError(format!(
            "submission template placeholder `{}` uses unsupported formatting",
            &caps[0]
        )));
    }

    match (caps.get(1), &caps[0]) {
        (Some(name), _) => lookup(name.as_str()).ok_or_else(|| {
            ClustersideError::ConfigError(format!(
                "submission template references unknown field `{}`",
                name.as_str()
            ))
        }),
        (None, "{{") => Ok("{".to_string()),
        (None, _) => Ok("}".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "job_pk" => Some("7".to_string()),
            "image" => Some("docker://alpine".to_string()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_named_fields() {
        let out = render_with("#PBS -N job_{job_pk}\nrun {image}\n", lookup).unwrap();
        assert_eq!(out, "#PBS -N job_7\nrun docker://alpine\n");
    }

    #[test]
    fn doubled_braces_are_literal() {
        let out = render_with("echo ${{HOME}} {job_pk}", lookup).unwrap();
        assert_eq!(out, "echo ${HOME} 7");
    }

    #[test]
    fn lone_braces_pass_through() {
        let out = render_with("f() { true; }\n{ 1 }", lookup).unwrap();
        assert_eq!(out, "f() { true; }\n{ 1 }");
    }

    #[test]
    fn format_specs_are_rejected_not_copied() {
        for template in ["#PBS -N job_{job_pk:05d}", "{image!r}", "{input.path}", "{params[0]}"] {
            let err = render_with(template, lookup).unwrap_err();
            match err {
                ClustersideError::ConfigError(msg) => {
                    assert!(msg.contains("unsupported formatting"), "{template}: {msg}")
                }
                other => panic!("unexpected error for {template}: {other:?}"),
            }
        }
    }

    #[test]
    fn unresolved_placeholder_is_config_error() {
        let err = render_with("cd {workdir}", lookup).unwrap_err();
        match err {
            ClustersideError::ConfigError(msg) => assert!(msg.contains("workdir"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
