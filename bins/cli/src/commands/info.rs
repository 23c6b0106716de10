//! Info command handler.

use crate::format::{CliOutput, OutputMode, format_success};
use skucode_app::app_crate_version;
use skucode_core::{BuildInfo, build_info};

/// Run the info command.
pub fn run_info(mode: OutputMode) -> CliOutput {
    let build = build_info();
    let app_version = app_crate_version();
    let payload = serde_json::json!({
        "build": {
            "name": build.name,
            "version": build.version,
            "appVersion": app_version,
            "msrv": build.msrv,
            "target": build.target(),
            "profile": build.profile,
            "gitHash": build.git_hash,
            "gitDirty": build.git_dirty,
        }
    });
    format_success(mode, "info", payload, format_info_text(&build, app_version))
}

fn format_info_text(build: &BuildInfo, app_version: &str) -> String {
    format!(
        "version: {}\napp: {app_version}\nmsrv: {}\ntarget: {}\nprofile: {}\n",
        build.version_string(),
        build.msrv,
        build.target(),
        build.profile,
    )
}
