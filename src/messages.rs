//! User-facing strings resolved by dotted key from a JSON table.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
    time::SystemTime,
};

use anyhow::Context;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::{error, info};

struct Table {
    root: Value,
    modified: Option<SystemTime>,
}

pub struct Messages {
    path: Option<PathBuf>,
    table: RwLock<Table>,
}

fn read_table(path: &Path) -> anyhow::Result<(Value, Option<SystemTime>)> {
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read messages file {}", path.display()))?;
    let root: Value = serde_json::from_str(&raw)
        .with_context(|| format!("parse messages file {}", path.display()))?;
    anyhow::ensure!(root.is_object(), "messages file must hold a JSON object");
    Ok((root, modified))
}

impl Messages {
    pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let (root, modified) = read_table(&path)?;
        info!(path = %path.display(), "messages loaded");
        Ok(Self {
            path: Some(path),
            table: RwLock::new(Table { root, modified }),
        })
    }

    /// A fixed table that is never reloaded.
    #[cfg(test)]
    pub fn from_value(root: Value) -> Self {
        Self {
            path: None,
            table: RwLock::new(Table {
                root,
                modified: None,
            }),
        }
    }

    /// Re-reads the backing file if its modification time moved.
    /// Returns whether a new table was installed. A broken file keeps the
    /// previous table in place.
    pub fn reload_if_modified(&self) -> bool {
        let Some(path) = self.path.as_deref() else {
            return false;
        };
        let current = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        {
            let table = self.table.read().unwrap_or_else(|p| p.into_inner());
            if current.is_some() && table.modified == current {
                return false;
            }
        }
        match read_table(path) {
            Ok((root, modified)) => {
                let mut table = self.table.write().unwrap_or_else(|p| p.into_inner());
                table.root = root;
                table.modified = modified;
                info!(path = %path.display(), "messages reloaded");
                true
            }
            Err(e) => {
                error!(error = %e, "messages reload failed; keeping previous table");
                false
            }
        }
    }

    /// `reload_if_modified` on the blocking pool, for callers on the runtime.
    pub async fn refresh(self: Arc<Self>) -> bool {
        match tokio::task::spawn_blocking(move || self.reload_if_modified()).await {
            Ok(reloaded) => reloaded,
            Err(e) => {
                error!(error = %e, "messages reload task failed");
                false
            }
        }
    }

    pub fn get(&self, key: &str) -> String {
        self.get_with(key, &HashMap::new())
    }

    pub fn get_with(&self, key: &str, params: &HashMap<&str, String>) -> String {
        let table = self.table.read().unwrap_or_else(|p| p.into_inner());
        let mut node = &table.root;
        for segment in key.split('.') {
            match node.get(segment) {
                Some(next) => node = next,
                None => return format!("Message not found: {key}"),
            }
        }
        let Some(template) = node.as_str() else {
            return format!("Message not found: {key}");
        };
        if params.is_empty() {
            return template.to_string();
        }
        interpolate(template, params)
    }
}

fn interpolate(template: &str, params: &HashMap<&str, String>) -> String {
    lazy_static! {
        static ref PLACEHOLDER: Regex = Regex::new(r"\{(\w+)\}").unwrap();
    }
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match params.get(&caps[1]) {
            Some(v) => v.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
