use crate::infra::{default_scoring_config, InMemorySessionStore};
use clap::Args;
use empathy_coach::error::AppError;
use empathy_coach::training::debrief::{
    DebriefService, DebriefView, DialogueBlueprint, ScoringMode,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Use the continuous coaching script instead of the graded assessment.
    #[arg(long)]
    pub(crate) coaching: bool,
    /// Answer every line with the strongest option so no re-run is offered.
    #[arg(long)]
    pub(crate) flawless: bool,
}

/// Console walk-through of the full flow: initial run, debrief, re-run of
/// the flagged beats, and the before/after comparison.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { coaching, flawless } = args;

    let (script, catalog, mode) = if coaching {
        let (script, catalog) = DialogueBlueprint::coaching();
        (script, catalog, ScoringMode::Coaching)
    } else {
        let (script, catalog) = DialogueBlueprint::assessment();
        (script, catalog, ScoringMode::Assessment)
    };

    println!("Empathy coaching demo");
    println!("Script: {} ({} lines)", script.title, script.line_count());

    let store = Arc::new(InMemorySessionStore::default());
    let service = DebriefService::new(script, catalog, mode, default_scoring_config(), store)?;

    println!("\nInitial run");
    let line_count = service.script().line_count();
    for line_index in 0..line_count {
        let option_index = demo_choice(line_index, flawless);
        let line = &service.script().lines[line_index];
        println!(
            "- Line {}: {} -> \"{}\"",
            line_index + 1,
            line.prompt,
            line.options[option_index].label
        );
        if let Err(err) = service.answer(line_index, option_index) {
            println!("  answer rejected: {err}");
            return Ok(());
        }
    }

    let view = match service.advance_to_debrief() {
        Ok(view) => view,
        Err(err) => {
            println!("Could not enter debrief: {err}");
            return Ok(());
        }
    };

    println!("\nDebrief");
    render_snapshot(&view);

    if !view.rerun_available {
        println!("No weak beats flagged; the session ends here.");
        return Ok(());
    }

    println!("\nFlagged for re-run:");
    for line in &view.flagged {
        println!("- Line {}: {}", line.line_index + 1, line.prompt);
        println!("  Cue: {}", line.coaching_cue);
    }

    if let Err(err) = service.begin_rerun() {
        println!("Could not start the re-run: {err}");
        return Ok(());
    }

    println!("\nRe-run (choosing the strongest option this time)");
    for line in &view.flagged {
        if let Err(err) = service.answer_rerun(line.line_index, 0) {
            println!("  re-run answer rejected: {err}");
            return Ok(());
        }
    }

    let final_view = match service.complete_rerun() {
        Ok(view) => view,
        Err(err) => {
            println!("Could not complete the re-run: {err}");
            return Ok(());
        }
    };

    println!("\nAfter the re-run");
    render_snapshot(&final_view);

    if let Some(delta) = &final_view.delta {
        println!("\nChange per signal (re-run minus initial)");
        for entry in delta {
            println!("- {}: {:+}", entry.key.0, entry.change);
        }
    }

    Ok(())
}

/// Deterministic answer pattern: strongest option everywhere, except two
/// deliberately weak beats so the re-run path has something to show.
fn demo_choice(line_index: usize, flawless: bool) -> usize {
    if flawless {
        return 0;
    }
    match line_index {
        3 => 2,
        5 => 1,
        _ => 0,
    }
}

fn render_snapshot(view: &DebriefView) {
    println!(
        "Phase: {} | total {:.1} / {:.1}",
        view.phase.label(),
        view.snapshot.total,
        view.snapshot.max
    );
    for score in &view.snapshot.values {
        println!("- {}: {:.1}", score.key.0, score.value);
    }
}
