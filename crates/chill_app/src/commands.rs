// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command implementations for the `chill` binary.

use crate::context::AppContext;
use anyhow::{bail, Context as _};
use chill_graph::persistence;
use chill_graph::{ProcessorId, Selectable};
use clap::Args;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// A document argument
#[derive(Args)]
pub struct DocumentArgs {
    /// Path to the graph document
    pub document: PathBuf,
}

/// Export arguments
#[derive(Args)]
pub struct ExportArgs {
    /// Path to the graph document
    pub document: PathBuf,

    /// Output file (defaults to the configured export file next to the document)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// List the node library
pub fn nodes(ctx: &AppContext) -> anyhow::Result<()> {
    let library = ctx.library();
    if library.is_empty() {
        println!("No nodes found in {:?}", ctx.settings().node_dirs);
        return Ok(());
    }
    for def in library.definitions() {
        let inputs: Vec<String> = def
            .inputs
            .iter()
            .map(|i| format!("{}: {}", i.name, i.io_type()))
            .collect();
        let outputs: Vec<String> = def
            .outputs
            .iter()
            .map(|o| format!("{}: {}", o.name, o.io_type))
            .collect();
        let category = if def.category.is_empty() { "-" } else { def.category.as_str() };
        println!(
            "{:<24} {:<16} ({}) -> ({}){}",
            def.name,
            category,
            inputs.join(", "),
            outputs.join(", "),
            if def.emits { " emits" } else { "" }
        );
    }
    Ok(())
}

/// Create an empty document
pub fn new(ctx: &mut AppContext, args: DocumentArgs) -> anyhow::Result<()> {
    if args.document.exists() {
        bail!("{} already exists", args.document.display());
    }
    ctx.new_document(Some(args.document.clone()));
    ctx.save()?;
    println!("Created {}", args.document.display());
    Ok(())
}

/// Summarize a document
pub fn info(ctx: &mut AppContext, args: DocumentArgs) -> anyhow::Result<()> {
    ctx.open(&args.document)
        .with_context(|| format!("opening {}", args.document.display()))?;
    let graph = ctx.graph();
    let groups = graph.processors().filter(|p| p.graph().is_some()).count();

    println!("File:        {}", args.document.display());
    println!("Processors:  {}", graph.processor_count());
    println!("Groups:      {groups}");
    println!("Connections: {}", graph.connection_count());
    println!("Comments:    {}", graph.comments().count());
    println!();
    print_processors(ctx, &mut std::io::stdout())?;
    Ok(())
}

/// Print the declarative script of a document
pub fn script(ctx: &mut AppContext, args: DocumentArgs) -> anyhow::Result<()> {
    ctx.open(&args.document)
        .with_context(|| format!("opening {}", args.document.display()))?;
    print!("{}", persistence::to_script(ctx.graph()));
    Ok(())
}

/// Generate the program for a document
pub fn export(ctx: &mut AppContext, args: ExportArgs) -> anyhow::Result<()> {
    ctx.open(&args.document)
        .with_context(|| format!("opening {}", args.document.display()))?;
    let path = match args.output {
        Some(path) => {
            ctx.export_to(&path)?;
            path
        }
        None => ctx.export()?,
    };
    println!("Exported {}", path.display());
    Ok(())
}

/// Export a document and hand it to the slicer
pub fn slice(ctx: &mut AppContext, args: DocumentArgs) -> anyhow::Result<()> {
    ctx.open(&args.document)
        .with_context(|| format!("opening {}", args.document.display()))?;
    ctx.launch_slicer()?;
    println!("Slicer started on {}", ctx.export_path().display());
    Ok(())
}

/// Edit a document interactively from standard input
pub fn edit(ctx: &mut AppContext, args: DocumentArgs) -> anyhow::Result<()> {
    if args.document.exists() {
        ctx.open(&args.document)?;
    } else {
        ctx.new_document(Some(args.document.clone()));
    }
    let stdin = std::io::stdin();
    run_shell(ctx, stdin.lock(), &mut std::io::stdout())
}

fn print_processors(ctx: &AppContext, out: &mut impl Write) -> std::io::Result<()> {
    for (index, p) in ctx.graph().processors().enumerate() {
        let inputs: Vec<&str> = p.inputs().iter().map(|i| i.name.as_str()).collect();
        let outputs: Vec<&str> = p.outputs().iter().map(|o| o.name.as_str()).collect();
        writeln!(
            out,
            "{:>3}  {:<20} [{}] -> [{}]{}{}",
            index + 1,
            p.name,
            inputs.join(", "),
            outputs.join(", "),
            if p.is_emitter() { " emit" } else { "" },
            if p.is_dirty() { " *" } else { "" }
        )?;
    }
    Ok(())
}

const SHELL_HELP: &str = "\
commands:
  ls                               list processors
  add <node> [x y]                 add a library node
  rm <n>                           remove processor n
  connect <n> <output> <m> <input> link n.output to m.input
  group <n>...                     collapse processors into a group
  ungroup <n>                      expand a group
  undo | redo | history
  save | export | slice
  quit";

/// Read shell commands line by line until `quit` or end of input
pub fn run_shell(ctx: &mut AppContext, input: impl BufRead, out: &mut impl Write) -> anyhow::Result<()> {
    for line in input.lines() {
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.first() {
            None => continue,
            Some(&"quit" | &"exit") => break,
            Some(_) => {}
        }
        if let Err(e) = shell_command(ctx, &words, out) {
            writeln!(out, "error: {e:#}")?;
        }
    }
    if ctx.is_modified() {
        writeln!(out, "unsaved changes discarded")?;
    }
    Ok(())
}

/// Processor by its 1-based position in the listing
fn processor_at(ctx: &AppContext, word: &str) -> anyhow::Result<ProcessorId> {
    let index: usize = word.parse().with_context(|| format!("'{word}' is not a processor number"))?;
    index
        .checked_sub(1)
        .and_then(|i| ctx.graph().processor_ids().nth(i))
        .with_context(|| format!("no processor {index}"))
}

fn shell_command(ctx: &mut AppContext, words: &[&str], out: &mut impl Write) -> anyhow::Result<()> {
    match words {
        ["help"] => writeln!(out, "{SHELL_HELP}")?,
        ["ls"] => print_processors(ctx, out)?,
        ["add", node] => {
            ctx.add_node(node, [0.0, 0.0])?;
        }
        ["add", node, x, y] => {
            ctx.add_node(node, [x.parse()?, y.parse()?])?;
        }
        ["rm", n] => {
            let id = processor_at(ctx, n)?;
            ctx.remove(id)?;
        }
        ["connect", from, output, to, input] => {
            let from = processor_at(ctx, from)?;
            let to = processor_at(ctx, to)?;
            if !ctx.connect(from, output, to, input)? {
                bail!("connection refused");
            }
        }
        ["group", members @ ..] if !members.is_empty() => {
            let selection = members
                .iter()
                .map(|n| processor_at(ctx, n).map(Selectable::Processor))
                .collect::<anyhow::Result<Vec<_>>>()?;
            if ctx.collapse(&selection)?.is_none() {
                bail!("selection cannot be grouped");
            }
        }
        ["ungroup", n] => {
            let id = processor_at(ctx, n)?;
            if ctx.expand(id)?.is_none() {
                bail!("not a group, or its links cannot be restored");
            }
        }
        ["undo"] => {
            let description = ctx.history().undo_description().map(str::to_string);
            ctx.undo()?;
            writeln!(out, "undid {}", description.unwrap_or_default())?;
        }
        ["redo"] => {
            let description = ctx.history().redo_description().map(str::to_string);
            ctx.redo()?;
            writeln!(out, "redid {}", description.unwrap_or_default())?;
        }
        ["history"] => {
            let history = ctx.history();
            let stats = history.stats();
            writeln!(
                out,
                "{} undo / {} redo of {} ({} bytes){}{}",
                stats.undo_count,
                stats.redo_count,
                stats.max_depth,
                stats.memory_used,
                if history.can_undo() { "" } else { ", nothing to undo" },
                if history.can_redo() { "" } else { ", nothing to redo" },
            )?;
        }
        ["save"] => {
            ctx.save()?;
            if let Some(path) = ctx.path() {
                writeln!(out, "saved {}", path.display())?;
            }
        }
        ["export"] => {
            let path = ctx.export()?;
            writeln!(out, "exported {}", path.display())?;
        }
        ["slice"] => ctx.launch_slicer()?,
        _ => bail!("unknown command '{}' (try 'help')", words.join(" ")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use chill_graph::{NodeDefinition, NodeLibrary};
    use std::io::Cursor;

    fn context() -> AppContext {
        let mut library = NodeLibrary::new();
        library.register(NodeDefinition::parse("number", "output(\"value\", \"scalar\")\n"));
        library.register(NodeDefinition::parse(
            "offset",
            "x = input(\"x\", \"scalar\")\noutput(\"value\", \"scalar\")\n",
        ));
        AppContext::new(Settings::default(), library)
    }

    fn run(ctx: &mut AppContext, script: &str) -> String {
        let mut out = Vec::new();
        run_shell(ctx, Cursor::new(script), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_shell_builds_graph() {
        let mut ctx = context();
        let out = run(&mut ctx, "add number\nadd offset 100 0\nconnect 1 value 2 x\nls\n");
        assert_eq!(ctx.graph().processor_count(), 2);
        assert_eq!(ctx.graph().connection_count(), 1);
        assert!(out.contains("offset"));
        assert!(out.contains("unsaved changes discarded"));
    }

    #[test]
    fn test_shell_reports_errors_and_continues() {
        let mut ctx = context();
        let out = run(&mut ctx, "add teapot\nconnect 1 a 2 b\nfrobnicate\nadd number\n");
        assert_eq!(out.matches("error:").count(), 3);
        assert_eq!(ctx.graph().processor_count(), 1);
    }

    #[test]
    fn test_shell_group_undo() {
        let mut ctx = context();
        run(
            &mut ctx,
            "add number\nadd offset\nconnect 1 value 2 x\ngroup 2\nundo\n",
        );
        assert!(ctx.graph().processors().all(|p| p.graph().is_none()));
        assert_eq!(ctx.graph().connection_count(), 1);

        let out = run(&mut ctx, "redo\nungroup 2\nhistory\n");
        assert!(out.contains("redid group"));
        assert!(out.contains("nothing to redo"));
        assert_eq!(ctx.graph().processor_count(), 2);
        assert_eq!(ctx.graph().connection_count(), 1);
    }

    #[test]
    fn test_shell_stops_at_quit() {
        let mut ctx = context();
        run(&mut ctx, "add number\nquit\nadd number\n");
        assert_eq!(ctx.graph().processor_count(), 1);
    }

    #[test]
    fn test_new_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.chill");
        let mut ctx = context();
        new(&mut ctx, DocumentArgs { document: path.clone() }).unwrap();
        assert!(path.exists());
        assert!(new(&mut ctx, DocumentArgs { document: path }).is_err());
    }
}
