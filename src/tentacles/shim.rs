//! Loader shim generation.
//!
//! Every category folder holds an aggregate loader file with one activation
//! line per installed tentacle, and every tentacle folder holds a loader file
//! that activates the tentacle only when the host's compatibility check
//! accepts its `(version, name, origin)`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::InstallError;
use super::descriptor::TentacleDescriptor;

const DEFAULT_LOADER_FILE: &str = "__init__.py";
const DEFAULT_ACTIVATION: &str = "from .{name} import *";
const DEFAULT_LOADER_TEMPLATE: &str = r#"from octobot_tentacles_manager.api.inspector import check_tentacle
from octobot_commons.logging.logging_util import get_logger

if check_tentacle('{version}', '{name}', '{origin}'):
    try:
        {activation}
    except Exception as e:
        get_logger('TentacleLoader').exception(e, True, f'Error when loading {name}: {e}')
"#;

/// Text templates for generated loader files.
///
/// `activation` may use `{name}`; `loader` may use `{name}`, `{version}`,
/// `{origin}` and `{activation}`. Other braces are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShimTemplate {
    pub aggregate_file_name: String,
    pub loader_file_name: String,
    pub activation: String,
    pub loader: String,
}

impl Default for ShimTemplate {
    fn default() -> Self {
        Self {
            aggregate_file_name: DEFAULT_LOADER_FILE.into(),
            loader_file_name: DEFAULT_LOADER_FILE.into(),
            activation: DEFAULT_ACTIVATION.into(),
            loader: DEFAULT_LOADER_TEMPLATE.into(),
        }
    }
}

impl ShimTemplate {
    pub fn activation_line(&self, descriptor: &TentacleDescriptor) -> String {
        render(&self.activation, &[("name", &descriptor.name)])
    }

    pub fn loader_content(&self, descriptor: &TentacleDescriptor) -> String {
        let activation = self.activation_line(descriptor);
        render(
            &self.loader,
            &[
                ("version", &escape_literal(&descriptor.version)),
                ("name", &escape_literal(&descriptor.name)),
                ("origin", &escape_literal(&descriptor.origin)),
                ("activation", &activation),
            ],
        )
    }
}

/// Writes loader shims, serializing read-modify-write cycles per aggregate file.
#[derive(Debug, Default)]
pub struct ShimWriter {
    template: ShimTemplate,
    file_locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl ShimWriter {
    pub fn new(template: ShimTemplate) -> Self {
        Self {
            template,
            file_locks: DashMap::new(),
        }
    }

    pub fn template(&self) -> &ShimTemplate {
        &self.template
    }

    /// Appends the activation line of `descriptor` to the aggregate file in
    /// `category_dir` unless an identical line is already there.
    ///
    /// Returns whether the file changed.
    pub async fn update_aggregate_file(
        &self,
        descriptor: &TentacleDescriptor,
        category_dir: &Path,
    ) -> Result<bool, InstallError> {
        let path = category_dir.join(&self.template.aggregate_file_name);
        let line = self.template.activation_line(descriptor);

        let lock = self
            .file_locks
            .entry(path.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let mut content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(InstallError::io("read", &path, e)),
        };
        if content.lines().any(|existing| existing.trim_end() == line) {
            return Ok(false);
        }

        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&line);
        content.push('\n');
        write_atomic(&path, &content).await?;
        Ok(true)
    }

    /// Regenerates the loader file inside `tentacle_dir`.
    pub async fn write_loader_file(
        &self,
        descriptor: &TentacleDescriptor,
        tentacle_dir: &Path,
    ) -> Result<PathBuf, InstallError> {
        let path = tentacle_dir.join(&self.template.loader_file_name);
        write_atomic(&path, &self.template.loader_content(descriptor)).await?;
        Ok(path)
    }
}

/// Writes through a sibling temporary file so readers never see a torn file.
async fn write_atomic(path: &Path, content: &str) -> Result<(), InstallError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("shim");
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    tokio::fs::write(&tmp, content)
        .await
        .map_err(|e| InstallError::io("write", &tmp, e))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(InstallError::io("replace", path, e));
    }
    Ok(())
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Single-pass `{key}` substitution; unknown keys are left untouched.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let replaced = after.find('}').and_then(|end| {
            let key = &after[..end];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, end))
        });
        match replaced {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
