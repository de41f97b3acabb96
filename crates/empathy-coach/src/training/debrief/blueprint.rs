use std::collections::BTreeMap;

use super::catalog::{SignalCatalog, SignalDefinition};
use super::domain::{
    DialogueLine, DialogueScript, OptionEffect, ResponseOption, SignalKey,
};

/// Built-in scripts and catalogs for the two scoring models. External script
/// providers can supply their own; these back the demo, the stateless
/// scoring endpoint, and the default service wiring.
#[derive(Debug)]
pub struct DialogueBlueprint;

impl DialogueBlueprint {
    /// Six-line workplace assessment over the expanded six-signal model.
    /// Each line is bound to exactly one signal and every option carries an
    /// explicit 0-2 score.
    pub fn assessment() -> (DialogueScript, SignalCatalog) {
        let script = assessment_script();
        let catalog = SignalCatalog::new(assessment_signals()).bind_script(&script);
        (script, catalog)
    }

    /// Five-line coaching dialogue scored on the continuous three-signal
    /// model, with signed per-signal effects on each option.
    pub fn coaching() -> (DialogueScript, SignalCatalog) {
        let script = coaching_script();
        let catalog = SignalCatalog::new(coaching_signals());
        (script, catalog)
    }
}

fn signal(
    key: &str,
    label: &str,
    abbreviation: &str,
    description: &str,
    line_index: Option<usize>,
) -> SignalDefinition {
    SignalDefinition {
        key: SignalKey::new(key),
        label: label.to_string(),
        abbreviation: abbreviation.to_string(),
        description: description.to_string(),
        line_index,
    }
}

fn assessment_signals() -> Vec<SignalDefinition> {
    vec![
        signal(
            "active_listening",
            "Active Listening",
            "AL",
            "Lets the speaker finish and reflects what was actually said.",
            Some(0),
        ),
        signal(
            "empathy",
            "Empathy",
            "EM",
            "Acknowledges the feeling behind the words before problem-solving.",
            Some(1),
        ),
        signal(
            "clarity",
            "Clarity",
            "CL",
            "States intent and next steps without hedging or jargon.",
            Some(2),
        ),
        signal(
            "respect",
            "Respect",
            "RS",
            "Keeps the other person's standing intact, especially under pressure.",
            Some(3),
        ),
        signal(
            "responsiveness",
            "Responsiveness",
            "RP",
            "Answers what was asked instead of redirecting to one's own agenda.",
            Some(4),
        ),
        signal(
            "constructive_framing",
            "Constructive Framing",
            "CF",
            "Turns friction into a shared problem rather than a verdict.",
            Some(5),
        ),
    ]
}

fn discrete(label: &str, score: u8) -> ResponseOption {
    ResponseOption {
        label: label.to_string(),
        effect: OptionEffect::Discrete { score },
    }
}

fn assessment_line(
    persona: &str,
    prompt: &str,
    cue: &str,
    options: Vec<ResponseOption>,
) -> DialogueLine {
    DialogueLine {
        speaker_role: "colleague".to_string(),
        persona: persona.to_string(),
        prompt: prompt.to_string(),
        coaching_cue: cue.to_string(),
        options,
    }
}

fn assessment_script() -> DialogueScript {
    DialogueScript {
        title: "Missed handoff with Priya".to_string(),
        lines: vec![
            assessment_line(
                "Priya",
                "I flagged the integration risk twice last sprint and nobody replied. Now it's my fault the release slipped?",
                "Show you heard the history, not just the complaint.",
                vec![
                    discrete("\"You flagged it twice and got silence - that would frustrate me too. Walk me through what you sent?\"", 2),
                    discrete("\"Releases slip for lots of reasons, let's not dwell on who flagged what.\"", 1),
                    discrete("\"I don't remember any flags. Are you sure you sent them to the right channel?\"", 0),
                ],
            ),
            assessment_line(
                "Priya",
                "Honestly I stayed late three nights covering for the gap. I'm running on empty.",
                "Name the feeling before touching the logistics.",
                vec![
                    discrete("\"Three late nights covering for others - that sounds exhausting. Thank you, and I'm sorry it landed on you.\"", 2),
                    discrete("\"We all pull late nights near a release. It should calm down soon.\"", 1),
                    discrete("\"Next time just stop at five, nobody asked you to stay.\"", 0),
                ],
            ),
            assessment_line(
                "Priya",
                "So what actually happens now? Leadership keeps saying 'we'll align' and I have no idea what that means.",
                "Trade the buzzwords for one concrete commitment.",
                vec![
                    discrete("\"Concretely: I'll get the risk review on Thursday's agenda and send you the owner list by tomorrow noon.\"", 2),
                    discrete("\"There are a few moving pieces, but we're working on alignment across the teams.\"", 1),
                    discrete("\"That's above both of us, I wouldn't worry about it.\"", 0),
                ],
            ),
            assessment_line(
                "Priya",
                "In the retro, Tomas said my estimates were 'fantasy numbers'. In front of everyone.",
                "Protect her standing without attacking Tomas.",
                vec![
                    discrete("\"That comment was out of line and your estimates deserved a real discussion. I'll raise how we give feedback in retros.\"", 2),
                    discrete("\"Tomas is blunt with everyone, try not to take it personally.\"", 1),
                    discrete("\"Well, the estimates were pretty optimistic, to be fair.\"", 0),
                ],
            ),
            assessment_line(
                "Priya",
                "Can you at least tell me whether the Q3 scope still includes my migration work?",
                "Answer the question she asked.",
                vec![
                    discrete("\"Yes - the migration is still in Q3 scope as of this morning's plan. I'll forward you the doc.\"", 2),
                    discrete("\"Scope is always in flux, let's talk about your growth goals instead.\"", 1),
                    discrete("\"Why does it matter? Priorities come from above anyway.\"", 0),
                ],
            ),
            assessment_line(
                "Priya",
                "I just don't want the next release to turn into another blame hunt.",
                "Close by making it a shared problem with a next step.",
                vec![
                    discrete("\"Agreed. Let's write the risk-escalation path together so silence can't happen again - thirty minutes tomorrow?\"", 2),
                    discrete("\"Hopefully people will behave better next time.\"", 1),
                    discrete("\"Then don't give them anything to blame you for.\"", 0),
                ],
            ),
        ],
    }
}

fn coaching_signals() -> Vec<SignalDefinition> {
    vec![
        signal(
            "understanding",
            "Understanding",
            "UN",
            "Grasps the other person's situation and constraints.",
            None,
        ),
        signal(
            "empathy",
            "Empathy",
            "EM",
            "Connects with the emotional undercurrent of the exchange.",
            None,
        ),
        signal(
            "clarity",
            "Clarity",
            "CL",
            "Communicates position and next steps unambiguously.",
            None,
        ),
    ]
}

fn continuous(label: &str, effects: &[(&str, f64)]) -> ResponseOption {
    let effects: BTreeMap<SignalKey, f64> = effects
        .iter()
        .map(|(key, value)| (SignalKey::new(*key), *value))
        .collect();
    ResponseOption {
        label: label.to_string(),
        effect: OptionEffect::Continuous { effects },
    }
}

fn coaching_script() -> DialogueScript {
    DialogueScript {
        title: "One-on-one with a struggling report".to_string(),
        lines: vec![
            DialogueLine {
                speaker_role: "report".to_string(),
                persona: "Daniel".to_string(),
                prompt: "I know my review numbers dipped. Before you say anything - my mother was in hospital most of March.".to_string(),
                coaching_cue: "Open with the person, not the metrics.".to_string(),
                options: vec![
                    continuous("\"Stop - family first. How is she doing now, and how are you holding up?\"", &[("empathy", 1.0), ("understanding", 0.5)]),
                    continuous("\"Noted. Let's go through the numbers and then circle back to that.\"", &[("clarity", 0.5), ("empathy", -0.5)]),
                    continuous("\"March is behind us, I'd rather focus on the quarter ahead.\"", &[("empathy", -1.0)]),
                ],
            },
            DialogueLine {
                speaker_role: "report".to_string(),
                persona: "Daniel".to_string(),
                prompt: "She's better, thanks. But I'm behind on the billing rewrite and I can't see how to catch up.".to_string(),
                coaching_cue: "Understand the gap before prescribing.".to_string(),
                options: vec![
                    continuous("\"Show me where it stands - which pieces feel stuck and which are just slow?\"", &[("understanding", 1.0), ("clarity", 0.5)]),
                    continuous("\"Everyone falls behind sometimes. Just do your best.\"", &[("empathy", 0.5), ("clarity", -0.5)]),
                    continuous("\"Catching up is what weekends are for.\"", &[("empathy", -1.0), ("understanding", -0.5)]),
                ],
            },
            DialogueLine {
                speaker_role: "report".to_string(),
                persona: "Daniel".to_string(),
                prompt: "Part of the problem is that the spec changed twice and nobody told me until code review.".to_string(),
                coaching_cue: "Validate the process failure without excusing the outcome.".to_string(),
                options: vec![
                    continuous("\"Finding out at review is a process failure, not a you failure. I'll fix the notification gap - and let's re-baseline the estimate.\"", &[("understanding", 1.0), ("empathy", 0.5), ("clarity", 0.5)]),
                    continuous("\"Specs always change, you have to keep up on your own.\"", &[("understanding", -0.5), ("empathy", -0.5)]),
                    continuous("\"Who changed it? I'll have a word with them.\"", &[("empathy", 0.5), ("clarity", -0.5)]),
                ],
            },
            DialogueLine {
                speaker_role: "report".to_string(),
                persona: "Daniel".to_string(),
                prompt: "Honestly, I've been wondering if I'm still the right person for this project.".to_string(),
                coaching_cue: "Meet the doubt directly; don't paper over it.".to_string(),
                options: vec![
                    continuous("\"I hear real doubt there. From where I sit you are - the last month was circumstances, not capability. Can I tell you what I saw you do well?\"", &[("empathy", 1.0), ("understanding", 1.0)]),
                    continuous("\"Don't be dramatic, you're fine.\"", &[("empathy", -0.5)]),
                    continuous("\"If you feel that way, maybe we should discuss reassignment.\"", &[("clarity", 0.5), ("empathy", -1.0)]),
                ],
            },
            DialogueLine {
                speaker_role: "report".to_string(),
                persona: "Daniel".to_string(),
                prompt: "Okay. So what do we actually do about the rewrite deadline?".to_string(),
                coaching_cue: "End with a concrete, owned plan.".to_string(),
                options: vec![
                    continuous("\"We cut scope to the invoicing path, I take the renewal flow off your plate, and we review progress Friday. Sound workable?\"", &[("clarity", 1.0), ("understanding", 0.5)]),
                    continuous("\"Let's see how next week goes and take it from there.\"", &[("clarity", -0.5)]),
                    continuous("\"Deadlines are deadlines. Make it work.\"", &[("clarity", 0.5), ("empathy", -1.0)]),
                ],
            },
        ],
    }
}
