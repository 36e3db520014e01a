//! The standard actions registered by the core build class.
//!
//! | Action          | Depends on | Does                                          |
//! |-----------------|------------|-----------------------------------------------|
//! | `configure`     |            | Reports prerequisites, writes the checkpoint  |
//! | `code`          |            | Stages libraries and scripts, compiles C      |
//! | `docs`          | `code`     | Generates documentation with `doc_command`    |
//! | `build`         | `code`, `docs` |                                           |
//! | `test`          | `code`     | Runs every test file                          |
//! | `install`       | `build`    | Copies the staging tree to its destinations   |
//! | `fakeinstall`   | `build`    | Shows what `install` would copy               |
//! | `clean`         |            | Removes build products                        |
//! | `realclean`     | `clean`    | Also removes the checkpoint and dist directory|
//! | `distdir`       |            | Assembles `<dist_name>-<dist_version>/`       |
//! | `dist`          | `distdir`  | Archives the dist directory                   |
//! | `prereq_report` |            | Prints every prerequisite and its status      |
//! | `help`          |            | Lists the actions                             |

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::context::ActionContext;
use super::files::{
    collect_files, collect_files_with_extension, copy_if_modified, copy_tree, remove_path,
    set_mode,
};
use super::registry::ActionRegistry;
use crate::builder::Builder;
use crate::error::{BuildError, Result};
use crate::freshness::up_to_date;
use crate::install::InstallType;
use crate::prereqs::report;
use crate::toolchain::shell::{self, CommandOptions};
use crate::ui::{Table, Theme};

/// Environment variable pointing test commands at the staging tree.
pub const BLIB_ENV: &str = "MODBUILD_BLIB";

/// Register the standard actions on behalf of `class`.
pub fn register(class: &str, actions: &mut ActionRegistry) -> Result<()> {
    actions.register(class, "configure", "Check prerequisites and save the configuration", configure)?;
    actions.register(class, "code", "Stage libraries and scripts, compile C sources", code)?;
    actions.register(class, "docs", "Generate documentation", docs)?;
    actions.register(class, "build", "Run 'code' and 'docs'", build)?;
    actions.register(class, "test", "Run the test files", test)?;
    actions.register(class, "install", "Install the staging tree", install)?;
    actions.register(class, "fakeinstall", "Show what 'install' would do", fakeinstall)?;
    actions.register(class, "clean", "Remove build products", clean)?;
    actions.register(class, "realclean", "Remove build products and saved configuration", realclean)?;
    actions.register(class, "distdir", "Assemble the distribution directory", distdir)?;
    actions.register(class, "dist", "Create the distribution archive", dist)?;
    actions.register(class, "prereq_report", "Show the status of every prerequisite", prereq_report)?;
    actions.register(class, "help", "List the available actions", help)?;
    Ok(())
}

fn configure(ctx: &mut ActionContext<'_>) -> Result<()> {
    let builder = ctx.builder();

    if let Some(failures) = builder.prereq_failures() {
        for line in report::render(&failures).lines() {
            tracing::warn!("{}", line);
        }
    }

    let path = builder.write_checkpoint()?;
    tracing::info!(
        "Configured {} {} ({})",
        builder.dist_name(),
        builder.dist_version(),
        path.display()
    );
    Ok(())
}

fn code(ctx: &mut ActionContext<'_>) -> Result<()> {
    let builder = ctx.builder();
    let props = builder.props();
    let blib = builder.blib();

    let lib_dir = builder.path(props.text("lib_dir").unwrap_or("lib"));
    let copied = copy_tree(&lib_dir, &blib.join(InstallType::Lib.as_str()))?;
    if copied > 0 {
        tracing::info!("Staged {} library files", copied);
    }

    let script_dir = builder.path(props.text("script_dir").unwrap_or("bin"));
    let script_blib = blib.join(InstallType::Script.as_str());
    let mode = props.text("script_mode");
    for script in collect_files(&script_dir) {
        let rel = script.strip_prefix(&script_dir).unwrap_or(&script);
        let dest = script_blib.join(rel);
        if copy_if_modified(&script, &dest)? {
            if let Some(mode) = mode {
                set_mode(&dest, mode)?;
            }
        }
    }

    if props.text("c_source").is_some() {
        compile_c_sources(builder)?;
    }
    Ok(())
}

/// Compile `c_source/**/*.c` into `_build/obj` and link the objects into
/// `blib/arch/auto/<Module>/<Leaf>.<ext>`.
fn compile_c_sources(builder: &Builder) -> Result<()> {
    let props = builder.props();
    let Some(c_source) = props.text("c_source").map(|dir| builder.path(dir)) else {
        return Ok(());
    };

    let sources = collect_files_with_extension(&c_source, "c");
    if sources.is_empty() {
        tracing::debug!("No C sources under {}", c_source.display());
        return Ok(());
    }

    let mut include_dirs = vec![c_source.clone()];
    include_dirs.extend(props.list("include_dirs").iter().map(|d| builder.path(d)));
    let compiler = &builder.toolchain().compiler;
    let obj_dir = builder.build_dir().join("obj");

    let mut objects = Vec::with_capacity(sources.len());
    for source in &sources {
        let rel = source.strip_prefix(&c_source).unwrap_or(source);
        let object = obj_dir.join(rel).with_extension("o");
        if !up_to_date(source, &object) {
            compiler.compile(
                source,
                &object,
                &include_dirs,
                props.list("extra_compiler_flags"),
            )?;
        }
        objects.push(object);
    }

    let module = props.text("module_name").unwrap_or(builder.dist_name());
    let parts: Vec<&str> = module.split("::").collect();
    let leaf = parts.last().copied().unwrap_or(module);
    let ext = props.text("shared_lib_ext").unwrap_or("so");
    let lib = parts
        .iter()
        .fold(builder.blib().join(InstallType::Arch.as_str()).join("auto"), |p, part| {
            p.join(part)
        })
        .join(format!("{}.{}", leaf, ext));

    if !up_to_date(&objects, &lib) {
        compiler.link(&objects, &lib, props.list("extra_linker_flags"))?;
    }
    Ok(())
}

fn docs(ctx: &mut ActionContext<'_>) -> Result<()> {
    ctx.depends_on(&["code"])?;

    let builder = ctx.builder();
    let Some(command) = builder.props().text("doc_command") else {
        tracing::debug!("No doc_command set, skipping documentation");
        return Ok(());
    };

    let blib = builder.blib();
    let jobs = [
        (InstallType::Lib, InstallType::Libdoc, "3"),
        (InstallType::Script, InstallType::Bindoc, "1"),
    ];

    for (from, to, section) in jobs {
        let src_root = blib.join(from.as_str());
        for source in collect_files(&src_root) {
            let rel = source.strip_prefix(&src_root).unwrap_or(&source);
            let dest = blib.join(to.as_str()).join(doc_name(rel, section));
            if up_to_date(&source, &dest) {
                continue;
            }
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let line = command
                .replace("{source}", &source.to_string_lossy())
                .replace("{dest}", &dest.to_string_lossy());
            let result = shell::execute(&line, &CommandOptions::in_dir(builder.base_dir()))?;
            shell::check(result, &line)?;
        }
    }
    Ok(())
}

/// `Foo/Bar.pm` becomes `Foo::Bar.3`.
fn doc_name(rel: &Path, section: &str) -> String {
    let stem: Vec<String> = rel
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("{}.{}", stem.join("::"), section)
}

fn build(ctx: &mut ActionContext<'_>) -> Result<()> {
    ctx.depends_on(&["code", "docs"])
}

fn test(ctx: &mut ActionContext<'_>) -> Result<()> {
    ctx.depends_on(&["code"])?;

    let builder = ctx.builder();
    let props = builder.props();
    let files = test_files(builder);
    if files.is_empty() {
        println!("No tests defined.");
        return Ok(());
    }

    let verbose = props.flag("verbose");
    let template = props.text("test_command").unwrap_or("{file}");
    let mut options = CommandOptions::in_dir(builder.base_dir());
    options.capture = !verbose;
    options
        .env
        .insert(BLIB_ENV.to_string(), builder.blib().to_string_lossy().into_owned());

    let theme = Theme::for_stdout();
    let mut failed = 0;
    for file in &files {
        let rel = file.strip_prefix(builder.base_dir()).unwrap_or(file);
        let rel = rel.to_string_lossy();
        let line = template.replace("{file}", &rel);
        let result = shell::execute(&line, &options)?;

        if result.success {
            println!("{} .. {}", rel, theme.success.apply_to("ok"));
        } else {
            failed += 1;
            println!("{} .. {}", rel, theme.error.apply_to("FAILED"));
            if !verbose && !result.stderr.is_empty() {
                eprint!("{}", result.stderr);
            }
        }
    }

    if failed > 0 {
        return Err(BuildError::TestsFailed {
            failed,
            total: files.len(),
        });
    }
    println!("All tests successful.");
    Ok(())
}

/// `test_files` when set, otherwise every `*.<test_extension>` under `test_dir`.
fn test_files(builder: &Builder) -> Vec<PathBuf> {
    let props = builder.props();
    let explicit = props.list("test_files");
    if !explicit.is_empty() {
        return explicit.iter().map(|f| builder.path(f)).collect();
    }
    let dir = builder.path(props.text("test_dir").unwrap_or("t"));
    collect_files_with_extension(&dir, props.text("test_extension").unwrap_or("t"))
}

fn install_map(builder: &Builder) -> Result<BTreeMap<PathBuf, PathBuf>> {
    let map = builder.install_config()?.install_map(&builder.blib());
    Ok(map.into_iter().filter(|(from, _)| from.is_dir()).collect())
}

fn install(ctx: &mut ActionContext<'_>) -> Result<()> {
    ctx.depends_on(&["build"])?;

    let builder = ctx.builder();
    let mut total = 0;
    for (from, to) in install_map(builder)? {
        let copied = copy_tree(&from, &to)?;
        if copied > 0 {
            tracing::info!("Installed {} files to {}", copied, to.display());
        }
        total += copied;
    }
    if total == 0 {
        tracing::info!("Everything is up to date");
    }
    Ok(())
}

fn fakeinstall(ctx: &mut ActionContext<'_>) -> Result<()> {
    ctx.depends_on(&["build"])?;

    let builder = ctx.builder();
    for (from, to) in install_map(builder)? {
        for file in collect_files(&from) {
            let rel = file.strip_prefix(&from).unwrap_or(&file);
            let dest = to.join(rel);
            if !up_to_date(&file, &dest) {
                println!("Installing {}", dest.display());
            } else {
                println!("Skipping {} (unchanged)", dest.display());
            }
        }
    }
    Ok(())
}

fn clean(ctx: &mut ActionContext<'_>) -> Result<()> {
    let builder = ctx.builder();
    let mut targets = vec![builder.blib(), builder.build_dir().join("obj")];
    targets.extend(
        builder
            .props()
            .list("add_to_cleanup")
            .iter()
            .map(|p| builder.path(p)),
    );

    for target in targets {
        if remove_path(&target)? {
            tracing::info!("Removed {}", target.display());
        }
    }
    Ok(())
}

fn realclean(ctx: &mut ActionContext<'_>) -> Result<()> {
    ctx.depends_on(&["clean"])?;

    let builder = ctx.builder();
    for target in [builder.build_dir(), builder.path(builder.dist_dir_name())] {
        if remove_path(&target)? {
            tracing::info!("Removed {}", target.display());
        }
    }
    Ok(())
}

fn distdir(ctx: &mut ActionContext<'_>) -> Result<()> {
    let builder = ctx.builder();
    let dist_dir = builder.path(builder.dist_dir_name());
    remove_path(&dist_dir)?;
    std::fs::create_dir_all(&dist_dir)?;

    let mut copied = 0;
    for entry in builder.props().list("dist_files") {
        let source = builder.path(entry);
        if !source.exists() {
            tracing::debug!("Skipping missing dist file {}", entry);
            continue;
        }
        copied += copy_tree(&source, &dist_dir.join(entry))?;
    }

    tracing::info!("Created {} ({} files)", dist_dir.display(), copied);
    Ok(())
}

fn dist(ctx: &mut ActionContext<'_>) -> Result<()> {
    ctx.depends_on(&["distdir"])?;

    let builder = ctx.builder();
    let name = builder.dist_dir_name();
    let dist_dir = builder.path(&name);
    let files: Vec<PathBuf> = collect_files(&dist_dir)
        .into_iter()
        .filter_map(|f| f.strip_prefix(builder.base_dir()).ok().map(Path::to_path_buf))
        .collect();

    let archiver = &builder.toolchain().archiver;
    let dest = builder.path(format!("{}.{}", name, archiver.extension()));
    let archive = archiver.create_archive(&dest, builder.base_dir(), &files)?;
    remove_path(&dist_dir)?;

    tracing::info!("Created {}", archive.display());
    Ok(())
}

fn prereq_report(ctx: &mut ActionContext<'_>) -> Result<()> {
    let builder = ctx.builder();
    let prereqs = builder.prerequisites();
    if prereqs.is_empty() {
        println!("No prerequisites declared.");
        return Ok(());
    }

    let checker = builder.checker();
    let failures = checker.prereq_failures(&prereqs).unwrap_or_default();
    let theme = Theme::for_stdout();

    for (scope, entries) in prereqs.buckets() {
        let bucket = scope.name();
        let failed = failures.get(&bucket);
        let severity = report::Severity::for_kind(scope.kind);

        let mut table = Table::new(&["Module", "Need", "Have", "Status"]);
        for (module, spec) in entries {
            let status = checker.check_installed_status(module, Some(spec));
            let mark = match failed.and_then(|f| f.get(module)) {
                None => theme.success.apply_to("ok".to_string()),
                Some(_) if severity == report::Severity::Warning => {
                    theme.warning.apply_to("missing".to_string())
                }
                Some(_) => theme.error.apply_to("FAILED".to_string()),
            };
            table.add_row(&[
                module.clone(),
                status.need,
                status.have.to_string(),
                mark.to_string(),
            ]);
        }

        println!("{}", theme.header.apply_to(&bucket));
        println!("{}", table.render());
    }
    Ok(())
}

fn help(ctx: &mut ActionContext<'_>) -> Result<()> {
    let builder = ctx.builder();
    let theme = Theme::for_stdout();
    let width = builder.actions().names().map(str::len).max().unwrap_or(0);

    println!(
        "{} {} {}",
        theme.header.apply_to("Actions for"),
        builder.dist_name(),
        builder.dist_version()
    );
    for action in builder.actions().iter() {
        println!(
            "  {}  {}",
            theme.key.apply_to(format!("{:width$}", action.name, width = width)),
            theme.dim.apply_to(&action.description)
        );
    }
    if let Some(default) = builder.props().text("default_action") {
        println!();
        println!("Default action: {}", default);
    }
    Ok(())
}
