// ABOUTME: Build description synthesis from a deployment spec.
// ABOUTME: Layers: base image, dependencies, source, env, port, start command.

use crate::config::{DeploymentSpec, EnvValue};
use nonempty::NonEmpty;

/// Name of the synthesized build description inside the context.
pub const CONTAINERFILE_NAME: &str = "Containerfile";

/// Render the build description.
///
/// The dependency layer copies only `requirements.txt` so source edits do not
/// invalidate the installed-packages layer. Secret-backed env entries are not
/// baked into the image; they bind in the pod spec only.
pub fn synthesize(spec: &DeploymentSpec) -> String {
    let mut lines = vec![
        format!("FROM {}", spec.build.base_image),
        "WORKDIR /app".to_string(),
        "COPY requirements.txt ./requirements.txt".to_string(),
        "RUN pip install --no-cache-dir -r requirements.txt".to_string(),
        "COPY . .".to_string(),
    ];

    let mut env: Vec<(&String, &String)> = spec
        .env
        .iter()
        .filter_map(|(k, v)| match v {
            EnvValue::Literal(s) => Some((k, s)),
            _ => None,
        })
        .collect();
    env.sort_by_key(|(k, _)| k.as_str());
    for (key, value) in env {
        lines.push(format!("ENV {}=\"{}\"", key, value.replace('"', "\\\"")));
    }

    lines.push(format!("EXPOSE {}", spec.port));
    lines.push(format!("CMD [\"python\", \"{}\"]", spec.build.entrypoint));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Render the dependency manifest copied into the context.
pub fn requirements_file(requirements: &NonEmpty<String>) -> String {
    let mut out = String::new();
    for requirement in requirements.iter() {
        out.push_str(requirement);
        out.push('\n');
    }
    out
}
