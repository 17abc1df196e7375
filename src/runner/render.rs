//! Template directory rendering
//!
//! Copies a directory of the template into the project. File and directory
//! names may contain `{{ }}` markers; a name that renders to nothing is
//! skipped along with its contents. Files ending in `.tmpl` have their
//! contents rendered and the suffix dropped, everything else is copied as is.

use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::expression::Scope;
use crate::runner::template::{has_markers, render_template};
use crate::runner::Context;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Suffix of files whose contents are rendered
pub const TEMPLATE_SUFFIX: &str = ".tmpl";

fn render_error(path: &Path, error: impl ToString) -> ExecutionError {
    ExecutionError::Render {
        path: path.to_path_buf(),
        error: error.to_string(),
    }
}

/// Turn a rendered entry name into a path relative to its target dir
///
/// The name may render to several components (`com/example/App.java`) but
/// must stay below the target dir.
fn relative_name(source_path: &Path, name: &str) -> ExecutionResult<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(render_error(
                    source_path,
                    format!("rendered name '{}' leaves the project directory", name),
                ))
            }
        }
    }
    Ok(relative)
}

/// Render `source` (relative to the template dir) into the project dir
///
/// Returns the paths of the files written.
pub fn render_dir(ctx: &Context, source: &str) -> ExecutionResult<Vec<PathBuf>> {
    let source_dir = ctx.template_dir.join(source);
    if !source_dir.is_dir() {
        return Err(render_error(&source_dir, "source is not a directory"));
    }

    let mut written = Vec::new();
    render_entries(ctx, &source_dir, &ctx.project_dir, &mut written)?;
    Ok(written)
}

fn render_entries(
    ctx: &Context,
    source_dir: &Path,
    target_dir: &Path,
    written: &mut Vec<PathBuf>,
) -> ExecutionResult<()> {
    let mut entries = fs::read_dir(source_dir)
        .map_err(|e| render_error(source_dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| render_error(source_dir, e))?;
    entries.sort_by_key(|entry| entry.file_name());

    let scope = Scope::new(&ctx.values).with_path_env_var(&ctx.path_env_var);

    for entry in entries {
        let source_path = entry.path();
        let raw_name = entry.file_name().to_string_lossy().into_owned();
        let name = if has_markers(&raw_name) {
            render_template(&scope, &raw_name)?
        } else {
            raw_name
        };
        let file_type = entry.file_type().map_err(|e| render_error(&source_path, e))?;
        let (out_name, render_contents) = match name.strip_suffix(TEMPLATE_SUFFIX) {
            Some(stripped) if !file_type.is_dir() => (stripped, true),
            _ => (name.as_str(), false),
        };

        let relative = relative_name(&source_path, out_name)?;
        if out_name.trim().is_empty() || relative.as_os_str().is_empty() {
            ctx.print_debug(&format!("Skipping {} (name renders empty)", source_path.display()));
            continue;
        }
        let target = target_dir.join(&relative);

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| render_error(&target, e))?;
            render_entries(ctx, &source_path, &target, written)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| render_error(parent, e))?;
        }
        if render_contents {
            ctx.print_debug(&format!("Rendering {}", target.display()));
            let contents =
                fs::read_to_string(&source_path).map_err(|e| render_error(&source_path, e))?;
            let rendered = render_template(&scope, &contents)?;
            fs::write(&target, rendered).map_err(|e| render_error(&target, e))?;
        } else {
            ctx.print_debug(&format!("Copying {}", target.display()));
            fs::copy(&source_path, &target).map_err(|e| render_error(&target, e))?;
        }
        written.push(target);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExpressionError;
    use serde_yaml::Value;
    use tempfile::TempDir;

    fn setup() -> (TempDir, TempDir) {
        let template = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let src = template.path().join("src");
        fs::create_dir_all(src.join("{{ .name }}")).unwrap();
        fs::write(src.join("README.md.tmpl"), "# {{ .name }}\n").unwrap();
        fs::write(src.join("{{ .name }}/main.go"), "package {{ raw }}\n").unwrap();
        fs::write(src.join("{{ .docker }}Dockerfile"), "FROM scratch\n").unwrap();
        (template, project)
    }

    fn context(template: &TempDir, project: &TempDir) -> Context {
        let mut ctx = Context::new()
            .with_template_dir(template.path().to_path_buf())
            .with_project_dir(project.path().to_path_buf());
        ctx.set_var("name".to_string(), Value::from("api"));
        ctx
    }

    #[test]
    fn test_render_dir() {
        let (template, project) = setup();
        let ctx = context(&template, &project);

        let written = render_dir(&ctx, "src").unwrap();
        assert_eq!(written.len(), 3);

        let readme = fs::read_to_string(project.path().join("README.md")).unwrap();
        assert_eq!(readme, "# api\n");

        // Non-template files are copied verbatim
        let main = fs::read_to_string(project.path().join("api/main.go")).unwrap();
        assert_eq!(main, "package {{ raw }}\n");

        // `.docker` is unset, so the name is just "Dockerfile"
        assert!(project.path().join("Dockerfile").is_file());
    }

    #[test]
    fn test_render_skips_empty_names() {
        let template = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let src = template.path().join("src");
        fs::create_dir_all(src.join("{{ .ci }}")).unwrap();
        fs::write(src.join("{{ .ci }}/pipeline.yml"), "steps: []\n").unwrap();

        let ctx = context(&template, &project);
        let written = render_dir(&ctx, "src").unwrap();
        assert!(written.is_empty());
    }

    #[test]
    fn test_render_rejects_names_leaving_project() {
        let template = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let src = template.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("{{ .name }}.txt"), "x\n").unwrap();

        let mut ctx = context(&template, &project);
        ctx.set_var("name".to_string(), Value::from("../escaped"));
        let result = render_dir(&ctx, "src");
        assert!(matches!(result, Err(ExecutionError::Render { .. })));
        assert!(!project.path().join("../escaped.txt").exists());

        ctx.set_var("name".to_string(), Value::from("/tmp/abs"));
        let result = render_dir(&ctx, "src");
        assert!(matches!(result, Err(ExecutionError::Render { .. })));
    }

    #[test]
    fn test_render_nested_file_name() {
        let template = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let src = template.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("{{ .pkg }}.java.tmpl"), "class {{ .name }} {}\n").unwrap();
        fs::write(src.join("{{ .pkg }}.txt"), "plain\n").unwrap();

        let mut ctx = context(&template, &project);
        ctx.set_var("pkg".to_string(), Value::from("com/example/App"));
        let written = render_dir(&ctx, "src").unwrap();
        assert_eq!(written.len(), 2);

        let java = fs::read_to_string(project.path().join("com/example/App.java")).unwrap();
        assert_eq!(java, "class api {}\n");
        assert!(project.path().join("com/example/App.txt").is_file());
    }

    #[test]
    fn test_render_missing_source() {
        let template = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let ctx = context(&template, &project);
        assert!(matches!(
            render_dir(&ctx, "nope"),
            Err(ExecutionError::Render { .. })
        ));
    }

    #[test]
    fn test_render_bad_template_contents() {
        let template = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let src = template.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("bad.txt.tmpl"), "{{ .name ").unwrap();

        let ctx = context(&template, &project);
        let result = render_dir(&ctx, "src");
        assert!(matches!(
            result,
            Err(ExecutionError::Template(ExpressionError::Parse { .. }))
        ));
    }
}
