// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Bounded, explicitly-documented environment overrides for non-protocol
// knobs. The wire formats and semaphore naming in this crate never depend on
// environment state (see metadata::wire and registry::name_pool) — only the
// handful of operational defaults below are environment-tunable.

/// Base host used by the RPC URL pool (`IPC_RPC_HOST`, default `127.11.2.78`).
const DEFAULT_RPC_HOST: &str = "127.11.2.78";
/// First port handed out by the RPC URL pool (`IPC_RPC_BASE_PORT`, default 8000).
const DEFAULT_RPC_BASE_PORT: u16 = 8000;

/// Runtime-tunable knobs that do not affect wire compatibility.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub rpc_host: String,
    pub rpc_base_port: u16,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            rpc_host: DEFAULT_RPC_HOST.to_owned(),
            rpc_base_port: DEFAULT_RPC_BASE_PORT,
        }
    }
}

impl RuntimeConfig {
    /// Build a config from the `IPC_RPC_HOST` / `IPC_RPC_BASE_PORT`
    /// environment variables, falling back to defaults when unset or unparsable.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(host) = std::env::var("IPC_RPC_HOST") {
            if !host.is_empty() {
                cfg.rpc_host = host;
            }
        }
        if let Ok(port) = std::env::var("IPC_RPC_BASE_PORT") {
            if let Ok(p) = port.parse() {
                cfg.rpc_base_port = p;
            } else {
                log::warn!("IPC_RPC_BASE_PORT={port:?} is not a valid port; using default");
            }
        }

        cfg
    }
}
