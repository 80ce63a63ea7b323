// ABOUTME: Tar build context assembly for the build engine.
// ABOUTME: Packs the source tree plus the synthesized build files.

use super::containerfile::CONTAINERFILE_NAME;
use crate::engine::BuildError;
use bytes::Bytes;
use std::path::Path;

/// Assemble the tar context the engine builds from: the source directory
/// (minus `.git`) plus the synthesized `Containerfile` and
/// `requirements.txt`, which shadow any files of the same name in source.
pub fn build_context(
    source: &Path,
    containerfile: &str,
    requirements: &str,
) -> Result<Bytes, BuildError> {
    let mut builder = tar::Builder::new(Vec::new());

    append_dir(&mut builder, source, Path::new(""))
        .map_err(|e| BuildError::Context(e.to_string()))?;

    append_file(&mut builder, CONTAINERFILE_NAME, containerfile.as_bytes())
        .map_err(|e| BuildError::Context(e.to_string()))?;
    append_file(&mut builder, "requirements.txt", requirements.as_bytes())
        .map_err(|e| BuildError::Context(e.to_string()))?;

    let data = builder
        .into_inner()
        .map_err(|e| BuildError::Context(e.to_string()))?;

    Ok(Bytes::from(data))
}

fn append_dir(
    builder: &mut tar::Builder<Vec<u8>>,
    dir: &Path,
    prefix: &Path,
) -> std::io::Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
    // Sorted for a stable context across runs on the same tree.
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name();
        if name == ".git" {
            continue;
        }

        let path = entry.path();
        let archived = prefix.join(&name);
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            append_dir(builder, &path, &archived)?;
        } else if file_type.is_file() {
            builder.append_path_with_name(&path, &archived)?;
        }
        // Symlinks and specials are skipped; the engine cannot use them
        // portably across platforms.
    }

    Ok(())
}

fn append_file(
    builder: &mut tar::Builder<Vec<u8>>,
    name: &str,
    data: &[u8],
) -> std::io::Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, name, data)
}
