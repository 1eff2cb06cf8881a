mod model_file;
mod os_signal_termination;
mod result;

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use blocksplit::convert_case::Case;
use blocksplit::decomposition::block_file_from_decomposition;
use blocksplit::decomposition::seeed_from_block_file;
use blocksplit::decomposition::seeed_from_partition;
use blocksplit::decomposition::DecompositionScore;
use blocksplit::decomposition::PartitionGraphKind;
use blocksplit::detectors::AutomorphismDetector;
use blocksplit::detectors::AutomorphismOptions;
use blocksplit::detectors::CoefficientMode;
use blocksplit::detectors::ColorClassDetector;
use blocksplit::detectors::ColorClassOptions;
use blocksplit::detectors::ConnectedComponentDetector;
use blocksplit::detectors::ConnectedComponentOptions;
use blocksplit::detectors::IrrelevancePolicyKind;
use blocksplit::files::BlockFile;
use blocksplit::files::Indexing;
use blocksplit::files::PartitionFile;
use blocksplit::model::Model;
use blocksplit::statistics::configure_statistic_logging;
use blocksplit::termination::Combinator;
use blocksplit::termination::TimeBudget;
use blocksplit::Decomposition;
use blocksplit::DetectionOptions;
use blocksplit::DetectorChainScheduler;
use blocksplit::DetectorSettings;
use clap::Parser;
use log::error;
use log::info;
use log::warn;
use log::LevelFilter;
use model_file::parse_model;
use os_signal_termination::OsSignal;
use result::BlocksplitError;
use result::BlocksplitResult;

#[derive(Debug, Parser)]
#[command(
    help_template = "\
{before-help}{name} {version}
Authors: {author}
About: {about}

{usage-heading}\n{tab}{usage}

{all-args}{after-help}
",
    author,
    version,
    about,
    arg_required_else_help = true
)]
struct Args {
    /// The constraint system to decompose, in the '*.model' line format:
    ///  - 'v <name> <b|i|c> [<lb> <ub> [<obj>]]' declares a variable,
    ///  - 'c <name> <handler> <lhs> <rhs> (<coef> <var>)*' declares a constraint.
    #[clap(verbatim_doc_comment)]
    model_path: PathBuf,

    /// A block assignment file with a known (possibly partial) decomposition of the model.
    ///
    /// Constraints which the file does not place are left to the detectors, unless the file
    /// contains `CONSDEFAULTMASTER`.
    #[arg(long = "dec")]
    dec_path: Option<PathBuf>,

    /// A partition file, assigning a block to the nodes of the constraint or the variable graph.
    #[arg(long = "partition")]
    partition_path: Option<PathBuf>,

    /// Which graph the nodes of the partition file belong to.
    #[arg(long, value_enum, default_value_t)]
    partition_nodes: PartitionGraphKind,

    /// The nodes of the partition file are numbered from 1 instead of from 0.
    #[arg(long)]
    partition_one_based: bool,

    /// The directory the decompositions are written to. Defaults to the directory of the model.
    ///
    /// The decomposition ranked `i` (best first, starting at 1) is written to
    /// '<model-name>.<i>.dec'.
    #[arg(short = 'o', long = "output-dir", verbatim_doc_comment)]
    output_dir: Option<PathBuf>,

    /// The time limit in milliseconds. Detection stops after the detector call which exceeds it.
    #[arg(short = 't', long = "time-limit")]
    time_limit: Option<u64>,

    /// Enables log message output from the detectors.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Enables the logging of statistics of the scheduler and every detector.
    #[arg(short = 's', long = "log-statistics")]
    log_statistics: bool,

    /// The number of rounds in which every detector is called on every seeed of the round.
    ///
    /// Possible values: usize
    #[arg(long = "max-rounds", default_value_t = 2, verbatim_doc_comment)]
    max_rounds: usize,

    /// Also report decompositions which consist of a single block.
    #[arg(long = "allow-single-block")]
    allow_single_block: bool,

    /// Do not complete the seeeds which are still open after the last round.
    #[arg(long = "no-finishing")]
    no_finishing: bool,

    /// Do not split the blocks of complete seeeds into their connected components.
    #[arg(long = "no-postprocessing")]
    no_postprocessing: bool,

    /// Do not run the connected component detector.
    #[arg(long = "no-connected-components")]
    no_connected_components: bool,

    /// Which constraints the connected component detector puts in the master up front.
    #[arg(long, value_enum, default_value_t)]
    irrelevance: IrrelevancePolicyKind,

    /// Report a single connected component as a decomposition when the irrelevant constraints
    /// form a non-empty master.
    #[arg(long = "seek-bordered")]
    seek_bordered: bool,

    /// Do not run the color class detector.
    #[arg(long = "no-color-classes")]
    no_color_classes: bool,

    /// The smallest number of color classes which are put in the master at once.
    ///
    /// Possible values: usize
    #[arg(long = "min-subset-size", default_value_t = 2, verbatim_doc_comment)]
    min_subset_size: usize,

    /// The largest number of color classes which are put in the master at once.
    ///
    /// Possible values: usize
    #[arg(long = "max-subset-size", default_value_t = 2, verbatim_doc_comment)]
    max_subset_size: usize,

    /// The color class detector does not run on seeeds with more color classes than this.
    ///
    /// Possible values: usize
    #[arg(long = "max-colors", default_value_t = 20, verbatim_doc_comment)]
    max_colors: usize,

    /// Do not run the automorphism detector.
    #[arg(long = "no-automorphism")]
    no_automorphism: bool,

    /// How coefficients are taken into account when looking for symmetric constraints.
    #[arg(long, value_enum, default_value_t)]
    coefficient_mode: CoefficientMode,

    /// The largest number of orbits the automorphism detector turns into seeeds per call.
    ///
    /// Possible values: usize
    #[arg(long = "max-candidates", default_value_t = 8, verbatim_doc_comment)]
    max_candidates: usize,

    /// The number of search nodes after which the automorphism search gives up.
    ///
    /// Possible values: usize
    #[arg(long = "node-budget", default_value_t = 100_000, verbatim_doc_comment)]
    node_budget: usize,
}

impl Args {
    fn detection_options(&self) -> DetectionOptions {
        DetectionOptions {
            max_rounds: self.max_rounds,
            allow_single_block: self.allow_single_block,
            enable_finishing: !self.no_finishing,
            enable_postprocessing: !self.no_postprocessing,
        }
    }

    fn build_scheduler(&self) -> DetectorChainScheduler<Model> {
        let mut scheduler = DetectorChainScheduler::new(self.detection_options());

        let _ = scheduler
            .add_detector(
                ConnectedComponentDetector::new(ConnectedComponentOptions {
                    irrelevance: self.irrelevance,
                    seek_bordered: self.seek_bordered,
                }),
                DetectorSettings {
                    enabled: !self.no_connected_components,
                    priority: 1,
                    ..Default::default()
                },
            )
            .add_detector(
                ColorClassDetector::new(ColorClassOptions {
                    min_subset_size: self.min_subset_size,
                    max_subset_size: self.max_subset_size,
                    max_colors: self.max_colors,
                }),
                DetectorSettings {
                    enabled: !self.no_color_classes,
                    ..Default::default()
                },
            )
            .add_detector(
                AutomorphismDetector::new(AutomorphismOptions {
                    coefficient_mode: self.coefficient_mode,
                    max_candidates: self.max_candidates,
                    node_budget: self.node_budget,
                    ..Default::default()
                }),
                DetectorSettings {
                    enabled: !self.no_automorphism,
                    ..Default::default()
                },
            );

        scheduler
    }
}

fn configure_logging(verbose: bool, log_statistics: bool) {
    if log_statistics {
        configure_statistic_logging("%%%blocksplit-stat:", None, Some(Case::Snake), None);
    }
    let level_filter = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .format(move |buf, record| {
            write!(buf, "c ")?;

            writeln!(buf, "{}", record.args())
        })
        .filter_level(level_filter)
        .target(env_logger::Target::Stdout)
        .init();
    info!("Logging successfully configured");
}

fn main() {
    match run() {
        Ok(()) => {}
        Err(e) => {
            error!("Execution failed, error: {e}");
            std::process::exit(1);
        }
    }
}

fn run() -> BlocksplitResult<()> {
    let args = Args::parse();
    configure_logging(args.verbose, args.log_statistics);

    if blocksplit::asserts::BLOCKSPLIT_ASSERT_LEVEL_DEFINITION
        >= blocksplit::asserts::BLOCKSPLIT_ASSERT_MODERATE
    {
        warn!(
            "Potential performance degradation: the blocksplit assert level is set to {}, meaning many debug asserts are active which may result in performance degradation.",
            blocksplit::asserts::BLOCKSPLIT_ASSERT_LEVEL_DEFINITION
        );
    };

    if args.model_path.extension().and_then(|ext| ext.to_str()) != Some("model") {
        return Err(BlocksplitError::invalid_instance(args.model_path.display()));
    }
    let model = parse_model(File::open(&args.model_path)?)?;
    info!(
        "Read a model with {} constraints, {} variables and {} nonzeros",
        model.num_constraints(),
        model.num_variables(),
        model.num_nonzeros()
    );

    let mut scheduler = args.build_scheduler();

    if let Some(dec_path) = args.dec_path.as_ref() {
        let block_file =
            BlockFile::parse(File::open(dec_path)?).map_err(|source| BlocksplitError::BlockFile {
                path: dec_path.display().to_string(),
                source,
            })?;
        let _ = scheduler.add_given_seeed(seeed_from_block_file(&model, &block_file)?);
    }

    if let Some(partition_path) = args.partition_path.as_ref() {
        let indexing = if args.partition_one_based {
            Indexing::OneBased
        } else {
            Indexing::ZeroBased
        };
        let partition = PartitionFile::parse(File::open(partition_path)?, indexing).map_err(
            |source| BlocksplitError::PartitionFile {
                path: partition_path.display().to_string(),
                source,
            },
        )?;
        let _ = scheduler.add_given_seeed(seeed_from_partition(
            &model,
            &partition,
            args.partition_nodes,
        )?);
    }

    let time_budget = args
        .time_limit
        .map(|time_limit| TimeBudget::starting_now(Duration::from_millis(time_limit)));
    let termination = Combinator::new(OsSignal::install()?, time_budget);

    let result = scheduler.detect(&model, termination);
    if args.log_statistics {
        scheduler.log_statistics();
    }
    if result.stopped_early {
        warn!("Detection was stopped before all detectors finished");
    }

    let output_dir = match args.output_dir.as_ref() {
        Some(output_dir) => output_dir.clone(),
        None => args
            .model_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    let model_name = args
        .model_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("model");

    println!("decompositions: {}", result.decompositions.len());
    for (index, decomposition) in result.decompositions.iter().enumerate() {
        let path = output_dir.join(format!("{model_name}.{}.dec", index + 1));
        write_decomposition(&model, decomposition, &path)?;
        print_summary(index + 1, decomposition, &path);
    }

    if !result.block_number_hints.is_empty() {
        let hints = result
            .block_number_hints
            .iter()
            .map(|hint| hint.to_string())
            .collect::<Vec<_>>();
        println!("block number hints: {}", hints.join(" "));
    }

    Ok(())
}

fn write_decomposition(
    model: &Model,
    decomposition: &Decomposition,
    path: &Path,
) -> BlocksplitResult<()> {
    let file = File::create(path)?;
    block_file_from_decomposition(model, decomposition).write(file)?;

    Ok(())
}

fn print_summary(rank: usize, decomposition: &Decomposition, path: &Path) {
    let score = DecompositionScore::of(decomposition);

    println!(
        "{rank}: {} blocks={} master={} linking={} score={:.4} detectors={} file={}",
        decomposition.decomposition_type(),
        decomposition.num_blocks(),
        decomposition.linking_constraints().len(),
        decomposition.linking_variables().len(),
        score.total(),
        decomposition.detectors().join(","),
        path.display()
    );
}
