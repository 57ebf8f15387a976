//! Output path derivation and generated-file discovery

use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use super::context::Operation;
use crate::core::error::{Error, Result};
use crate::infrastructure::openapi::resolver::normalize;

/// Suffix every generated file carries
pub const GENERATED_SUFFIX: &str = ".gen.ts";
/// Prefix of request handler file names
pub const HANDLER_PREFIX: &str = "handle_";

/// `<dir>/foo.schema.yaml` → `<dir>/foo.gen.ts`
pub fn generated_file_path(source: &Path) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or_default();
    source.with_file_name(format!("{stem}{GENERATED_SUFFIX}"))
}

/// Directory the route artifacts of `operation` are written to
pub fn route_output_dir(operation: &Operation, source: &Path, root_dir: &Path) -> PathBuf {
    match &operation.implementation_path {
        Some(path) => normalize(&root_dir.join(path)),
        None => source.parent().map(Path::to_path_buf).unwrap_or_default(),
    }
}

/// Module specifier a route uses to import its bundle, without `.ts`
pub fn types_import_path(route_dir: &Path, bundle: &Path) -> String {
    let relative = relative_path(route_dir, bundle);
    format!("./{}", relative.strip_suffix(".ts").unwrap_or(&relative))
}

/// `/`-separated path from directory `from` to `to`
pub fn relative_path(from: &Path, to: &Path) -> String {
    let from = normalize(from);
    let to = normalize(to);
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    std::iter::repeat_n("..".to_string(), from.len() - common)
        .chain(
            to[common..]
                .iter()
                .map(|c| c.as_os_str().to_string_lossy().into_owned()),
        )
        .collect::<Vec<_>>()
        .join("/")
}

pub fn is_generated_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(GENERATED_SUFFIX))
}

/// Every generated file below `root_dir`, sorted
pub async fn find_generated_files(root_dir: &Path) -> Result<Vec<PathBuf>> {
    let root = root_dir.to_path_buf();
    let mut files = tokio::task::spawn_blocking(move || {
        WalkDir::new(root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file() && is_generated_file(entry.path()))
            .map(|entry| entry.into_path())
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|e| Error::Io(std::io::Error::other(e)))?;

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::context::RouteAccess;
    use tempfile::TempDir;

    fn operation(implementation_path: Option<&str>) -> Operation {
        Operation {
            operation_id: "ReadRule".to_string(),
            type_name: "ReadRule".to_string(),
            snake_name: "read_rule".to_string(),
            method: "get".to_string(),
            path: "/api/rule".to_string(),
            summary: None,
            description: None,
            tags: Vec::new(),
            access: RouteAccess::Public,
            route_tags: Vec::new(),
            implementation_path: implementation_path.map(String::from),
            request_query: None,
            request_params: None,
            request_body: None,
            response: None,
        }
    }

    #[test]
    fn test_generated_file_path_cuts_at_first_dot() {
        assert_eq!(
            generated_file_path(Path::new("/repo/api/read_rule.schema.yaml")),
            PathBuf::from("/repo/api/read_rule.gen.ts")
        );
        assert_eq!(
            generated_file_path(Path::new("api/common.json")),
            PathBuf::from("api/common.gen.ts")
        );
    }

    #[test]
    fn test_route_output_dir() {
        let source = Path::new("/repo/common/api/rule.schema.yaml");
        let root = Path::new("/repo");

        assert_eq!(
            route_output_dir(&operation(None), source, root),
            PathBuf::from("/repo/common/api")
        );
        assert_eq!(
            route_output_dir(&operation(Some("server/routes/rule")), source, root),
            PathBuf::from("/repo/server/routes/rule")
        );
        assert_eq!(
            route_output_dir(&operation(Some("/abs/routes")), source, root),
            PathBuf::from("/abs/routes")
        );
    }

    #[test]
    fn test_types_import_path() {
        assert_eq!(
            types_import_path(
                Path::new("/repo/server/routes/rule"),
                Path::new("/repo/common/api/rule.gen.ts")
            ),
            "./../../../common/api/rule.gen"
        );
        assert_eq!(
            types_import_path(Path::new("/repo/api"), Path::new("/repo/api/rule.gen.ts")),
            "./rule.gen"
        );
        assert_eq!(
            types_import_path(Path::new("/repo"), Path::new("/repo/api/rule.gen.ts")),
            "./api/rule.gen"
        );
    }

    #[test]
    fn test_relative_path_normalizes_both_sides() {
        assert_eq!(
            relative_path(
                Path::new("/repo/server/./routes/../routes/rule"),
                Path::new("/repo/api/model/../rule.gen.ts")
            ),
            "../../../api/rule.gen.ts"
        );
        assert_eq!(
            relative_path(Path::new("/repo/api"), Path::new("/repo/api")),
            ""
        );
    }

    #[test]
    fn test_is_generated_file() {
        assert!(is_generated_file(Path::new("a/b.gen.ts")));
        assert!(!is_generated_file(Path::new("a/b.ts")));
        assert!(!is_generated_file(Path::new("a/b.gen.ts/c")));
    }

    #[tokio::test]
    async fn test_find_generated_files_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("b")).unwrap();
        std::fs::write(dir.path().join("b/z.gen.ts"), "").unwrap();
        std::fs::write(dir.path().join("a.gen.ts"), "").unwrap();
        std::fs::write(dir.path().join("a.ts"), "").unwrap();

        let files = find_generated_files(dir.path()).await.unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.gen.ts"), dir.path().join("b/z.gen.ts")]
        );
    }
}
