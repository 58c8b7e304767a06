use std::path::PathBuf;

use serde::Deserialize;
use tower_lsp::lsp_types::InitializeParams;

/// Server configuration, deserialized from the `initializationOptions`
/// payload of the `initialize` request. Every field defaults sensibly so a
/// client that sends no options at all still gets a working server.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Stub directories/files to load as builtins, in addition to the
    /// embedded Starlark stdlib stub.
    pub builtins: Vec<PathBuf>,
    /// Overrides the workspace root inferred from `initialize`, used to
    /// resolve relative `load()` paths.
    pub workspace_root: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_initialize_params(params: &InitializeParams) -> Self {
        params
            .initialization_options
            .clone()
            .and_then(|opts| serde_json::from_value(opts).ok())
            .unwrap_or_default()
    }
}

pub fn find_workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    if let Some(folders) = &params.workspace_folders {
        for folder in folders {
            if let Ok(path) = folder.uri.to_file_path() {
                return Some(path);
            }
        }
    }

    if let Some(root_uri) = &params.root_uri {
        if let Ok(path) = root_uri.to_file_path() {
            return Some(path);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_no_stub_directories() {
        let cfg = ServerConfig::default();
        assert!(cfg.builtins.is_empty());
        assert!(cfg.workspace_root.is_none());
    }

    #[test]
    fn parses_builtins_list_from_json() {
        let value = serde_json::json!({ "builtins": ["/opt/stubs"] });
        let cfg: ServerConfig = serde_json::from_value(value).unwrap();
        assert_eq!(cfg.builtins, vec![PathBuf::from("/opt/stubs")]);
    }
}
