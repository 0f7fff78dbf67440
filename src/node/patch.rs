//! Configuration rewriting before each launch.
//!
//! The main configuration document is YAML and is patched structurally:
//! parse, set named keys, re-serialize. The logging configuration and the
//! environment script are not structured documents, so they get a
//! line-anchored replacement of the first line starting with a key prefix.
//! Every patch is idempotent: a second application with the same inputs
//! leaves the file byte-identical.

use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use super::descriptor::NodeDescriptor;
use super::layout::{DirectoryManager, NodeDir, ENV_FILE, LOG4J_CONFIG, MAIN_CONFIG};
use super::store::write_atomic;
use crate::cluster::ClusterContext;
use crate::core::error::{NodeError, NodeResult};

/// Key of the log file line in the logging configuration.
pub const LOG_FILE_KEY: &str = "log4j.appender.R.File=";
/// Key of the root logger line in the logging configuration.
pub const ROOT_LOGGER_KEY: &str = "log4j.rootLogger=";
/// Key of the management port line in the environment script.
pub const JMX_PORT_KEY: &str = "JMX_PORT=";

/// Appenders kept on the root logger when its level changes.
const ROOT_APPENDERS: &str = "stdout,R";

/// Replace the first line of `text` that starts with `prefix`.
///
/// Returns `None` when no line matches.
pub fn replace_first_line(text: &str, prefix: &str, replacement: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len() + replacement.len());
    let mut replaced = false;
    for line in text.split_inclusive('\n') {
        if !replaced && line.starts_with(prefix) {
            let body = line.trim_end_matches(['\r', '\n']);
            out.push_str(replacement);
            out.push_str(&line[body.len()..]);
            replaced = true;
        } else {
            out.push_str(line);
        }
    }
    replaced.then_some(out)
}

/// Line-anchored replacement in a file.
///
/// A missing key is not an error: the file is left untouched, a warning is
/// logged and `false` is returned.
pub fn replace_in_file(path: &Path, prefix: &str, replacement: &str) -> NodeResult<bool> {
    let content = fs::read_to_string(path).map_err(|e| NodeError::io(path, e))?;
    match replace_first_line(&content, prefix, replacement) {
        Some(updated) => {
            if updated != content {
                write_atomic(path, updated.as_bytes())?;
                debug!(file = %path.display(), key = prefix, "replaced line");
            }
            Ok(true)
        }
        None => {
            warn!(file = %path.display(), key = prefix, "key not found, file left unchanged");
            Ok(false)
        }
    }
}

/// Rewrites a node's configuration artifacts from its descriptor and cluster.
pub struct ConfigPatcher<'a> {
    descriptor: &'a NodeDescriptor,
    dirs: &'a DirectoryManager,
    cluster: &'a dyn ClusterContext,
}

impl<'a> ConfigPatcher<'a> {
    pub fn new(
        descriptor: &'a NodeDescriptor,
        dirs: &'a DirectoryManager,
        cluster: &'a dyn ClusterContext,
    ) -> Self {
        Self {
            descriptor,
            dirs,
            cluster,
        }
    }

    /// Patch the main document, the logging configuration and the environment script.
    pub fn update_all(&self) -> NodeResult<()> {
        self.update_main_config()?;
        self.update_logging()?;
        self.update_env()?;
        Ok(())
    }

    /// Set bootstrap flag, seeds, endpoints, directories and partitioner.
    pub fn update_main_config(&self) -> NodeResult<()> {
        let path = self.dirs.conf_file(MAIN_CONFIG);
        let content = fs::read_to_string(&path).map_err(|e| NodeError::io(&path, e))?;
        let mut doc: Value = serde_yaml::from_str(&content).map_err(|source| NodeError::Yaml {
            path: path.clone(),
            source,
        })?;
        let map = doc
            .as_mapping_mut()
            .ok_or_else(|| NodeError::MissingConfigKey {
                path: path.clone(),
                key: "<top-level mapping>".to_string(),
            })?;

        self.apply_main_config(map, &path)?;

        let updated = serde_yaml::to_string(&doc).map_err(|source| NodeError::Yaml {
            path: path.clone(),
            source,
        })?;
        if updated != content {
            write_atomic(&path, updated.as_bytes())?;
        }
        debug!(node = self.descriptor.name(), file = %path.display(), "updated main configuration");
        Ok(())
    }

    fn apply_main_config(&self, map: &mut Mapping, path: &Path) -> NodeResult<()> {
        let d = self.descriptor;
        let seeds = self.cluster.seed_addresses();

        map.insert("auto_bootstrap".into(), Value::Bool(d.auto_bootstrap));

        // Older documents carry a flat `seeds` list; newer ones nest a
        // comma-joined string inside the seed provider parameters.
        if map.contains_key("seeds") {
            let list = seeds.iter().map(|s| Value::from(s.as_str())).collect();
            map.insert("seeds".into(), Value::Sequence(list));
        } else {
            let params = map
                .get_mut("seed_provider")
                .and_then(|v| v.get_mut(0))
                .and_then(|v| v.get_mut("parameters"))
                .and_then(|v| v.get_mut(0))
                .and_then(Value::as_mapping_mut)
                .ok_or_else(|| NodeError::MissingConfigKey {
                    path: path.to_path_buf(),
                    key: "seeds or seed_provider[0].parameters[0]".to_string(),
                })?;
            params.insert("seeds".into(), Value::from(seeds.join(",")));
        }

        map.insert(
            "listen_address".into(),
            Value::from(d.storage().address.as_str()),
        );
        map.insert("storage_port".into(), port_value(d.storage().port));
        map.insert("rpc_address".into(), Value::from(d.thrift().address.as_str()));
        map.insert("rpc_port".into(), port_value(d.thrift().port));

        map.insert(
            "data_file_directories".into(),
            Value::Sequence(vec![path_value(&self.dirs.dir(NodeDir::Data))]),
        );
        map.insert(
            "commitlog_directory".into(),
            path_value(&self.dirs.dir(NodeDir::CommitLogs)),
        );
        map.insert(
            "saved_caches_directory".into(),
            path_value(&self.dirs.dir(NodeDir::SavedCaches)),
        );

        if let Some(partitioner) = self.cluster.partitioner() {
            map.insert("partitioner".into(), Value::from(partitioner));
        }
        Ok(())
    }

    /// Point the file appender at the node's own log file.
    pub fn update_logging(&self) -> NodeResult<bool> {
        let log_file = self.dirs.log_file();
        replace_in_file(
            &self.dirs.conf_file(LOG4J_CONFIG),
            LOG_FILE_KEY,
            &format!("{}{}", LOG_FILE_KEY, log_file.display()),
        )
    }

    /// Set the management port in the environment script.
    pub fn update_env(&self) -> NodeResult<bool> {
        replace_in_file(
            &self.dirs.conf_file(ENV_FILE),
            JMX_PORT_KEY,
            &format!("{}{}", JMX_PORT_KEY, self.descriptor.jmx_port),
        )
    }

    /// Set the root logger level, keeping the console and file appenders.
    pub fn set_log_level(&self, level: &str) -> NodeResult<bool> {
        replace_in_file(
            &self.dirs.conf_file(LOG4J_CONFIG),
            ROOT_LOGGER_KEY,
            &format!(
                "{}{},{}",
                ROOT_LOGGER_KEY,
                level.to_ascii_uppercase(),
                ROOT_APPENDERS
            ),
        )
    }
}

fn port_value(port: u16) -> Value {
    Value::Number(u64::from(port).into())
}

fn path_value(path: &Path) -> Value {
    Value::String(path.to_string_lossy().into_owned())
}
