use anyhow::{Context, Result};
use tracing::{info, info_span};

use cde_ingest::{read_dataset, read_schema, write_dataset};
use cde_map::{load_mapping, save_mapping, validate};
use cde_model::{CollisionPolicy, MatchingOptions, OutputOrder, SynthesisOptions};
use cde_transform::ApplyError;

use cde_cli::pipeline::{build_embedder, run_apply as apply_table, run_matching};

use crate::cli::{ApplyArgs, CheckArgs, CodesArgs, MatchArgs};
use crate::summary::{
    print_codes, print_match_summary, print_synthesis_warnings, print_transform_warnings,
    print_violations,
};

pub fn run_match(args: &MatchArgs) -> Result<()> {
    let span = info_span!("match", dataset = %args.dataset.display());
    let _guard = span.enter();

    let dataset = read_dataset(&args.dataset)
        .with_context(|| format!("read dataset {}", args.dataset.display()))?;
    let schema = read_schema(&args.schema)
        .with_context(|| format!("read schema {}", args.schema.display()))?;
    let embedder = build_embedder(args.method, args.embeddings.as_deref())?;

    let options = MatchingOptions::new()
        .with_method(args.method)
        .with_top_k(args.top_k);
    let synthesis = SynthesisOptions::new().with_collision_policy(if args.deduplicate {
        CollisionPolicy::Deduplicate
    } else {
        CollisionPolicy::Preserve
    });
    let run = run_matching(&dataset, &schema, options, synthesis, embedder)?;

    save_mapping(&run.initial.table, &args.output)
        .with_context(|| format!("write mapping {}", args.output.display()))?;
    print_match_summary(&run.outcome, &run.initial.table);
    print_synthesis_warnings(&run.initial.warnings);
    println!("Mapping: {}", args.output.display());
    Ok(())
}

/// Returns whether the table is valid.
pub fn run_check(args: &CheckArgs) -> Result<bool> {
    let table = load_mapping(&args.mapping)
        .with_context(|| format!("read mapping {}", args.mapping.display()))?;
    let schema = read_schema(&args.schema)
        .with_context(|| format!("read schema {}", args.schema.display()))?;
    let violations = validate(table.rows(), &schema);
    if violations.is_empty() {
        println!("{} row(s), no violations", table.len());
        return Ok(true);
    }
    print_violations(&violations);
    Ok(false)
}

/// Returns whether the dataset was written.
pub fn run_apply(args: &ApplyArgs) -> Result<bool> {
    let span = info_span!("apply", dataset = %args.dataset.display());
    let _guard = span.enter();

    let dataset = read_dataset(&args.dataset)
        .with_context(|| format!("read dataset {}", args.dataset.display()))?;
    let table = load_mapping(&args.mapping)
        .with_context(|| format!("read mapping {}", args.mapping.display()))?;
    let schema = args
        .schema
        .as_deref()
        .map(|path| read_schema(path).with_context(|| format!("read schema {}", path.display())))
        .transpose()?;
    let order = if args.schema_ordered {
        OutputOrder::SchemaOrdered
    } else {
        OutputOrder::Unordered
    };

    let outcome = match apply_table(&dataset, &table, schema.as_ref(), order) {
        Ok(outcome) => outcome,
        Err(ApplyError::InvalidMapping { violations }) => {
            print_violations(&violations);
            return Ok(false);
        }
    };
    write_dataset(&outcome.dataset, &args.output)
        .with_context(|| format!("write dataset {}", args.output.display()))?;
    print_transform_warnings(&outcome.warnings);
    info!(output = %args.output.display(), "apply complete");
    println!(
        "Wrote {} column(s), {} row(s) to {}",
        outcome.dataset.width(),
        outcome.dataset.row_count(),
        args.output.display()
    );
    Ok(true)
}

pub fn run_codes(args: &CodesArgs) -> Result<()> {
    let schema = read_schema(&args.schema)
        .with_context(|| format!("read schema {}", args.schema.display()))?;
    print_codes(&schema);
    Ok(())
}
