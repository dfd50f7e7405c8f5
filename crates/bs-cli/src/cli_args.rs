use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "branchscript")]
#[command(about = "Branching dialogue player and authoring CLI")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Play(PlayArgs),
    Lint(LintArgs),
    Diff(DiffArgs),
    Draft(DraftArgs),
    Publish(PublishArgs),
    Unpublish(ChapterArgs),
    Status(StatusArgs),
}

#[derive(Debug, Args)]
pub(crate) struct PlayArgs {
    #[command(subcommand)]
    pub(crate) command: PlayCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum PlayCommand {
    Start(StartArgs),
    Choose(ChooseArgs),
    Ack(AckArgs),
    Line(LineArgs),
}

#[derive(Debug, Args)]
pub(crate) struct ScriptSource {
    #[arg(long = "script")]
    pub(crate) script: String,
    #[arg(long = "chapter")]
    pub(crate) chapter: Option<String>,
    #[arg(long = "endings")]
    pub(crate) endings: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct StartArgs {
    #[command(flatten)]
    pub(crate) source: ScriptSource,
    #[arg(long = "start-node")]
    pub(crate) start_node: Option<String>,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct ChooseArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "choice")]
    pub(crate) choice: usize,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct AckArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct LineArgs {
    #[command(flatten)]
    pub(crate) source: ScriptSource,
    #[arg(long = "state-file")]
    pub(crate) state_file: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct LintArgs {
    #[arg(long = "script", conflicts_with = "scripts_dir")]
    pub(crate) script: Option<String>,
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: Option<String>,
    #[arg(long = "cards")]
    pub(crate) cards: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct ChapterArgs {
    #[arg(long = "store")]
    pub(crate) store: String,
    #[arg(long = "chapter")]
    pub(crate) chapter: String,
}

#[derive(Debug, Args)]
pub(crate) struct DiffArgs {
    #[command(flatten)]
    pub(crate) target: ChapterArgs,
    /// Compare this file instead of the stored draft.
    #[arg(long = "script")]
    pub(crate) script: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct DraftArgs {
    #[command(subcommand)]
    pub(crate) command: DraftCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum DraftCommand {
    Save(DraftSaveArgs),
}

#[derive(Debug, Args)]
pub(crate) struct DraftSaveArgs {
    #[command(flatten)]
    pub(crate) target: ChapterArgs,
    #[arg(long = "script")]
    pub(crate) script: String,
}

#[derive(Debug, Args)]
pub(crate) struct PublishArgs {
    #[command(flatten)]
    pub(crate) target: ChapterArgs,
    #[arg(long = "script")]
    pub(crate) script: Option<String>,
    #[arg(long = "note", default_value = "")]
    pub(crate) note: String,
    #[arg(long = "expect-version")]
    pub(crate) expect_version: Option<u64>,
    /// Publish even when the checklist reports warnings.
    #[arg(long = "yes")]
    pub(crate) yes: bool,
}

#[derive(Debug, Args)]
pub(crate) struct StatusArgs {
    #[arg(long = "store")]
    pub(crate) store: String,
}
