//! Starlark fragment rendering.
//!
//! Every generated file comes from one of five Tera templates, chosen by the
//! shape of the [`ResolvedDependency`]:
//!
//! | Template | Used for | Provenance constant |
//! |---|---|---|
//! | `http_archive.bzl` | source tarballs, registry packages | `COMMIT` / `VERSION` |
//! | `release_archive.bzl` | release archives | `TAG_NAME` |
//! | `http_file.bzl` | release executables | `TAG_NAME` |
//! | `git_repository.bzl` | git remotes | `COMMIT` |
//! | `aggregate.bzl` | the per-list index | none |
//!
//! Templates never quote list or upstream values themselves; those go through
//! the `starlark` filter (see [`filters`]). Only derived macro names appear
//! bare. Rendering is deterministic: the same input always yields
//! byte-identical output.

pub mod filters;

use serde::Serialize;
use std::error::Error as _;
use tera::{Context as TeraContext, Tera, Value};

use crate::constants::{AGGREGATE_ENTRY_POINT, AUTOGENERATED_MARKER, PATCH_ARGS};
use crate::core::PinError;
use crate::manifest::Extras;
use crate::resolver::{Artifact, Reference, ResolvedDependency};

const HTTP_ARCHIVE: &str = r#"{{ marker }}

load("@//:build/http.bzl", "http_archive")

URL = {{ url | starlark }}
STRIP_PREFIX = {{ strip_prefix | starlark }}
SHA256 = {{ sha256 | starlark }}
TYPE = {{ archive_type | starlark }}{% for export in exports %}
{{ export.name }} = {{ export.value | starlark }}{% endfor %}

def {{ macro_name }}():
    http_archive(
        name = {{ name | starlark }},
        url = URL,
        strip_prefix = STRIP_PREFIX,
        type = TYPE,
        sha256 = SHA256,{% for attr in attrs %}
        {{ attr.name }} = {{ attr.value | starlark }},{% endfor %}
    )
"#;

const RELEASE_ARCHIVE: &str = r#"{{ marker }}

load("@//:build/http.bzl", "http_archive")

TAG_NAME = {{ tag_name | starlark }}
URL = {{ url | starlark }}
STRIP_PREFIX = {{ strip_prefix | starlark }}
SHA256 = {{ sha256 | starlark }}
TYPE = {{ archive_type | starlark }}{% for export in exports %}
{{ export.name }} = {{ export.value | starlark }}{% endfor %}

def {{ macro_name }}():
    http_archive(
        name = {{ name | starlark }},
        url = URL,
        strip_prefix = STRIP_PREFIX,
        type = TYPE,
        sha256 = SHA256,{% for attr in attrs %}
        {{ attr.name }} = {{ attr.value | starlark }},{% endfor %}
    )
"#;

const HTTP_FILE: &str = r#"{{ marker }}

load("@//:build/http.bzl", "http_file")

TAG_NAME = {{ tag_name | starlark }}
URL = {{ url | starlark }}
SHA256 = {{ sha256 | starlark }}

def {{ macro_name }}():
    http_file(
        name = {{ name | starlark }},
        url = URL,
        executable = True,
        sha256 = SHA256,{% for attr in attrs %}
        {{ attr.name }} = {{ attr.value | starlark }},{% endfor %}
    )
"#;

const GIT_REPOSITORY: &str = r#"{{ marker }}

load("@bazel_tools//tools/build_defs/repo:git.bzl", "git_repository")

URL = {{ url | starlark }}
COMMIT = {{ commit | starlark }}

def {{ macro_name }}():
    git_repository(
        name = {{ name | starlark }},
        remote = URL,
        commit = COMMIT,{% for attr in attrs %}
        {{ attr.name }} = {{ attr.value | starlark }},{% endfor %}
    )
"#;

// Loads are sorted for buildifier; calls keep declaration order.
const AGGREGATE: &str = r#"{{ marker }}
{% for name in loads %}
load("@//build/deps:gen/{{ name }}.bzl", "{{ name }}"){% endfor %}

def {{ entry_point }}():
{% for name in calls %}    {{ name }}()
{% endfor %}{% if calls | length == 0 %}    pass
{% endif %}"#;

/// A `NAME = value` pair; rendered either as a module constant or a rule keyword.
#[derive(Debug, Clone, Serialize)]
struct Binding {
    name: &'static str,
    value: Value,
}

impl Binding {
    fn new(name: &'static str, value: impl Into<Value>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Forwarded rule keywords in their fixed emission order.
fn extra_attrs(extras: &Extras) -> Vec<Binding> {
    let mut attrs = Vec::new();
    if let Some(build_file) = &extras.build_file {
        attrs.push(Binding::new("build_file", build_file.as_str()));
    }
    if let Some(content) = &extras.build_file_content {
        attrs.push(Binding::new("build_file_content", content.as_str()));
    }
    if let Some(mapping) = &extras.repo_mapping {
        attrs.push(Binding::new("repo_mapping", mapping.clone()));
    }
    if let Some(patches) = &extras.patches {
        attrs.push(Binding::new("patches", patches.clone()));
        attrs.push(Binding::new("patch_args", PATCH_ARGS.to_vec()));
    }
    if let Some(path) = &extras.downloaded_file_path {
        attrs.push(Binding::new("downloaded_file_path", path.as_str()));
    }
    attrs
}

/// Module-level constants beyond the template's fixed ones.
fn archive_exports(reference: &Reference, extras: &Extras) -> Vec<Binding> {
    let mut exports = Vec::new();
    match reference {
        Reference::Commit(sha) => exports.push(Binding::new("COMMIT", sha.as_str())),
        Reference::Version(num) => exports.push(Binding::new("VERSION", num.as_str())),
        Reference::Tag(_) => {}
    }
    if let Some(patches) = &extras.patches {
        exports.push(Binding::new("PATCHES", patches.clone()));
    }
    exports
}

/// Renders dependency and aggregate fragments.
#[derive(Debug)]
pub struct FragmentRenderer {
    tera: Tera,
}

impl FragmentRenderer {
    /// Compile the built-in templates.
    pub fn new() -> Result<Self, PinError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.register_filter("starlark", filters::starlark);
        tera.add_raw_templates(vec![
            ("http_archive.bzl", HTTP_ARCHIVE),
            ("release_archive.bzl", RELEASE_ARCHIVE),
            ("http_file.bzl", HTTP_FILE),
            ("git_repository.bzl", GIT_REPOSITORY),
            ("aggregate.bzl", AGGREGATE),
        ])
        .map_err(|e| template_error("built-in templates", &e))?;
        Ok(Self {
            tera,
        })
    }

    /// Render the fragment for one resolved dependency.
    pub fn render_dependency(&self, dep: &ResolvedDependency) -> Result<String, PinError> {
        let mut context = TeraContext::new();
        context.insert("marker", AUTOGENERATED_MARKER);
        context.insert("name", &dep.name);
        context.insert("macro_name", &dep.macro_name);
        context.insert("attrs", &extra_attrs(&dep.extras));

        let template = match &dep.artifact {
            Artifact::Archive {
                url,
                archive_type,
                strip_prefix,
                sha256,
            } => {
                context.insert("url", url);
                context.insert("archive_type", archive_type.as_str());
                context.insert("strip_prefix", strip_prefix);
                context.insert("sha256", sha256);
                context.insert("exports", &archive_exports(&dep.reference, &dep.extras));
                if let Reference::Tag(tag) = &dep.reference {
                    context.insert("tag_name", tag);
                    "release_archive.bzl"
                } else {
                    "http_archive.bzl"
                }
            }
            Artifact::Executable {
                url,
                sha256,
            } => {
                context.insert("tag_name", dep.reference.as_str());
                context.insert("url", url);
                context.insert("sha256", sha256);
                "http_file.bzl"
            }
            Artifact::GitCheckout {
                remote,
            } => {
                context.insert("url", remote);
                context.insert("commit", dep.reference.as_str());
                "git_repository.bzl"
            }
        };

        self.render(template, &context)
    }

    /// Render the index of one list. `macro_names` is in declaration order.
    pub fn render_aggregate(&self, macro_names: &[String]) -> Result<String, PinError> {
        let mut loads = macro_names.to_vec();
        loads.sort();

        let mut context = TeraContext::new();
        context.insert("marker", AUTOGENERATED_MARKER);
        context.insert("entry_point", AGGREGATE_ENTRY_POINT);
        context.insert("loads", &loads);
        context.insert("calls", macro_names);
        self.render("aggregate.bzl", &context)
    }

    fn render(&self, template: &str, context: &TeraContext) -> Result<String, PinError> {
        let rendered = self.tera.render(template, context).map_err(|e| template_error(template, &e))?;
        let mut out = rendered.trim_end().to_string();
        out.push('\n');
        Ok(out)
    }
}

fn template_error(template: &str, error: &tera::Error) -> PinError {
    let mut reason = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = cause.source();
    }
    PinError::Template {
        template: template.to_string(),
        reason,
    }
}
