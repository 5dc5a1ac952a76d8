use std::fs::File;
use std::io::Write;

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use sapi::analytics::{self, Prediction};
use sapi::backup::BackupManager;
use sapi::cli::{
    AnnotateArgs, BackupAction, Cli, Command, ExportAction, ExportArgs, GoalAction, GradeAction,
    NoteAction, ProgressAction, ReminderAction, SubjectAction,
};
use sapi::config::{AiConfig, Settings};
use sapi::error::Error;
use sapi::export::{self, ExportFilter};
use sapi::gateway::Gateway;
use sapi::record::store::Store;
use sapi::record::{
    GoalFields, GoalStatus, GradeFields, NoteFields, ProgressFields, RecordId, ReminderFields,
    Subject,
};
use sapi::report;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> sapi::Result<()> {
    let settings = Settings::load()?;
    let mut store = Store::open(&settings.data_dir)?;
    let backups = BackupManager::new(&settings.data_dir, &settings.backup_dir);

    match cli.command {
        Command::Subject { action } => match action {
            SubjectAction::Add { name, category } => {
                let subject = store.create_subject(&name, category)?;
                println!("added subject '{}' ({})", subject.name, subject.id);
            }
            SubjectAction::List => print!("{}", report::subjects(&store)),
            SubjectAction::Update { name, rename, category } => {
                let subject = resolve_subject(&store, &name)?;
                let new_name = rename.unwrap_or_else(|| subject.name.clone());
                let category = category.or(subject.category.clone());
                let updated = store.update_subject(subject.id, &new_name, category)?;
                println!("updated subject '{}'", updated.name);
            }
            SubjectAction::Remove { name } => {
                let subject = resolve_subject(&store, &name)?;
                store.delete_subject(subject.id)?;
                println!("removed subject '{name}'");
            }
        },

        Command::Grade { action } => match action {
            GradeAction::Add { subject, score, max_score, date, notes } => {
                let subject = resolve_subject(&store, &subject)?;
                let grade = store.create_grade(GradeFields {
                    subject_id: subject.id,
                    score,
                    max_score,
                    date: date.unwrap_or_else(|| Utc::now().date_naive()),
                    notes,
                })?;
                println!(
                    "recorded {}/{} for {} on {} ({})",
                    grade.score, grade.max_score, subject.name, grade.date, grade.id
                );
            }
            GradeAction::List { subject } => {
                let subject = resolve_subject(&store, &subject)?;
                let grades = store.grades_for(subject.id);
                let stats = analytics::stats(&store, subject.id)?;
                print!("{}", report::grades(&subject.name, &grades, stats));
            }
            GradeAction::Update { id, score, max_score, date, notes } => {
                let id = parse_id(&id, "grade")?;
                let existing = store.grade(id)?.clone();
                let updated = store.update_grade(
                    id,
                    GradeFields {
                        subject_id: existing.subject_id,
                        score,
                        max_score,
                        date: date.unwrap_or(existing.date),
                        notes: merge_notes(notes, existing.notes),
                    },
                )?;
                println!("updated grade to {}/{}", updated.score, updated.max_score);
            }
            GradeAction::Delete { id } => {
                store.delete_grade(parse_id(&id, "grade")?)?;
                println!("deleted grade {id}");
            }
        },

        Command::Goal { action } => match action {
            GoalAction::Add { subject, metric, target, deadline } => {
                let subject = resolve_subject(&store, &subject)?;
                let goal = store.create_goal(GoalFields {
                    subject_id: subject.id,
                    target_metric: metric,
                    target_value: target,
                    deadline,
                })?;
                println!("set goal '{}' = {} ({})", goal.target_metric, goal.target_value, goal.id);
            }
            GoalAction::List => {
                let goals: Vec<_> = store.goals().iter().collect();
                print!("{}", report::goals(&store, &goals));
            }
            GoalAction::Update { id, metric, target, deadline } => {
                let id = parse_id(&id, "goal")?;
                let existing = store.goal(id)?.clone();
                let updated = store.update_goal(
                    id,
                    GoalFields {
                        subject_id: existing.subject_id,
                        target_metric: metric.unwrap_or(existing.target_metric),
                        target_value: target.unwrap_or(existing.target_value),
                        deadline: deadline.or(existing.deadline),
                    },
                )?;
                println!("updated goal '{}' = {}", updated.target_metric, updated.target_value);
            }
            GoalAction::Complete { id, missed } => {
                let status = if missed { GoalStatus::Missed } else { GoalStatus::Achieved };
                let goal = store.set_goal_status(parse_id(&id, "goal")?, status)?;
                println!("goal '{}' marked {}", goal.target_metric, goal.status.as_str());
            }
            GoalAction::Delete { id } => {
                store.delete_goal(parse_id(&id, "goal")?)?;
                println!("deleted goal {id}");
            }
        },

        Command::Progress { action } => match action {
            ProgressAction::Add { subject, description, hours, date } => {
                let subject = resolve_subject(&store, &subject)?;
                let entry = store.create_progress(ProgressFields {
                    subject_id: subject.id,
                    date: date.unwrap_or_else(|| Utc::now().date_naive()),
                    description,
                    duration_hours: hours,
                })?;
                println!("logged {:.1}h for {} on {}", entry.duration_hours, subject.name, entry.date);
            }
            ProgressAction::List { subject } => {
                let subject = resolve_subject(&store, &subject)?;
                let entries = store.progress_for(subject.id);
                print!("{}", report::progress(&subject.name, &entries));
            }
            ProgressAction::Update { id, description, hours, date } => {
                let id = parse_id(&id, "progress entry")?;
                let existing = store.progress_entry(id)?.clone();
                let updated = store.update_progress(
                    id,
                    ProgressFields {
                        subject_id: existing.subject_id,
                        date: date.unwrap_or(existing.date),
                        description: description.unwrap_or(existing.description),
                        duration_hours: hours.unwrap_or(existing.duration_hours),
                    },
                )?;
                println!("updated progress entry to {:.1}h on {}", updated.duration_hours, updated.date);
            }
            ProgressAction::Delete { id } => {
                store.delete_progress(parse_id(&id, "progress entry")?)?;
                println!("deleted progress entry {id}");
            }
        },

        Command::Reminder { action } => match action {
            ReminderAction::Add { subject, date, text } => {
                let subject = resolve_subject(&store, &subject)?;
                let reminder = store.create_reminder(ReminderFields {
                    subject_id: subject.id,
                    date,
                    text,
                })?;
                println!("reminder set for {} ({})", reminder.date, reminder.id);
            }
            ReminderAction::List => {
                let reminders: Vec<_> = store.reminders().iter().collect();
                print!("{}", report::reminders(&store, &reminders));
            }
            ReminderAction::Update { id, date, text } => {
                let id = parse_id(&id, "reminder")?;
                let existing = store.reminder(id)?.clone();
                let updated = store.update_reminder(
                    id,
                    ReminderFields {
                        subject_id: existing.subject_id,
                        date: date.unwrap_or(existing.date),
                        text: text.unwrap_or(existing.text),
                    },
                )?;
                println!("reminder now set for {}", updated.date);
            }
            ReminderAction::Delete { id } => {
                store.delete_reminder(parse_id(&id, "reminder")?)?;
                println!("deleted reminder {id}");
            }
        },

        Command::Note { action } => match action {
            NoteAction::Add { title, body, subject } => {
                let subject_id = match subject {
                    Some(name) => Some(resolve_subject(&store, &name)?.id),
                    None => None,
                };
                let note = store.create_note(NoteFields { subject_id, title, body })?;
                println!("added note '{}' ({})", note.title, note.id);
            }
            NoteAction::List => {
                for note in store.notes() {
                    println!("{}  {}  {}", note.created_at.format("%Y-%m-%d"), note.id, note.title);
                }
                if store.notes().is_empty() {
                    println!("No notes.");
                }
            }
            NoteAction::Show { id } => {
                let note = store.note(parse_id(&id, "note")?)?;
                println!("{}\n\n{}", note.title, note.body);
            }
            NoteAction::Update { id, title, body } => {
                let id = parse_id(&id, "note")?;
                let existing = store.note(id)?.clone();
                let updated = store.update_note(
                    id,
                    NoteFields {
                        subject_id: existing.subject_id,
                        title: title.unwrap_or(existing.title),
                        body: body.unwrap_or(existing.body),
                    },
                )?;
                println!("updated note '{}'", updated.title);
            }
            NoteAction::Delete { id } => {
                store.delete_note(parse_id(&id, "note")?)?;
                println!("deleted note {id}");
            }
        },

        Command::Backup { action } => match action {
            BackupAction::Create => {
                let info = backups.snapshot()?;
                println!("snapshot {} ({} files, {} bytes)", info.id, info.files.len(), info.total_bytes);
            }
            BackupAction::List => print!("{}", report::snapshots(&backups.list()?)),
            BackupAction::Restore { id } => {
                backups.restore(&id, &mut store)?;
                println!("restored snapshot {id}");
            }
            BackupAction::Prune => {
                let removed = backups.prune(settings.backup_keep_days)?;
                println!("removed {removed} snapshot(s) older than {} days", settings.backup_keep_days);
            }
            BackupAction::Auto => {
                let result = backups.auto(settings.backup_keep_days)?;
                match result.created {
                    Some(info) => println!("snapshot {} created, {} pruned", info.id, result.pruned),
                    None => println!("recent snapshot exists, nothing to do"),
                }
            }
        },

        Command::Trend(args) => {
            let subject = resolve_subject(&store, &args.subject)?;
            let points = analytics::trend(&store, subject.id, args.window)?;
            print!("{}", report::trend(&subject.name, &points));
        }

        Command::Predict(args) => {
            let subject = resolve_subject(&store, &args.subject)?;
            let prediction = analytics::predict(
                &store,
                subject.id,
                args.method,
                settings.prediction_min_records,
            )?;

            match prediction {
                Prediction::Estimate(score) => {
                    println!("predicted next score for {}: {score:.1}%", subject.name);
                }
                Prediction::InsufficientData => {
                    println!(
                        "not enough grade records for {} (need at least {})",
                        subject.name, settings.prediction_min_records
                    );
                }
            }

            if let Some(target) = args.target {
                match analytics::required_score(&store, subject.id, target, args.remaining)? {
                    Some(needed) => println!(
                        "to average {target:.1}% you need {needed:.1}% on each of the next {} record(s)",
                        args.remaining
                    ),
                    None => println!("--remaining must be at least 1 to compute a required score"),
                }
            }
        }

        Command::Annotate(args) => {
            annotate(&store, &settings, args)?;
        }

        Command::Export { action } => match action {
            ExportAction::Grades(args) => {
                run_export(&store, args, |s, f, w| export::grades_csv(s, f, w))?
            }
            ExportAction::Progress(args) => {
                run_export(&store, args, |s, f, w| export::progress_csv(s, f, w))?
            }
            ExportAction::Goals(args) => {
                run_export(&store, args, |s, f, w| export::goals_csv(s, f, w))?
            }
        },
    }

    Ok(())
}

fn annotate(store: &Store, settings: &Settings, args: AnnotateArgs) -> sapi::Result<()> {
    let content = match (&args.text, &args.subject) {
        (Some(text), _) => text.clone(),
        (None, Some(name)) => {
            let subject = resolve_subject(store, name)?;
            subject_dossier(store, &subject)
        }
        (None, None) => {
            return Err(Error::Validation(vec![sapi::error::Violation::new(
                "content",
                "pass --text or --subject",
            )]));
        }
    };

    let config = AiConfig::from_env(settings.ai_timeout)?;
    let gateway = Gateway::new(config)?;
    let annotation = gateway.annotate(&content, args.mode)?;

    println!("{}", annotation.text);
    eprintln!("\n[{} via {}]", annotation.mode.as_str(), annotation.model);
    Ok(())
}

/// Render one subject's history as plain text for the AI endpoint.
fn subject_dossier(store: &Store, subject: &Subject) -> String {
    let mut content = format!("Subject: {}\n\nGrades:\n", subject.name);

    let mut grades = store.grades_for(subject.id);
    grades.sort_by_key(|g| g.date);
    for grade in &grades {
        content.push_str(&format!(
            "- {}: {}/{} ({:.1}%)\n",
            grade.date,
            grade.score,
            grade.max_score,
            grade.percent()
        ));
    }

    let goals = store.goals_for(subject.id);
    if !goals.is_empty() {
        content.push_str("\nGoals:\n");
        for goal in goals {
            content.push_str(&format!(
                "- {} = {} (status: {}{})\n",
                goal.target_metric,
                goal.target_value,
                goal.status.as_str(),
                goal.deadline
                    .map(|d| format!(", deadline {d}"))
                    .unwrap_or_default(),
            ));
        }
    }

    let total_hours: f64 = store
        .progress_for(subject.id)
        .iter()
        .map(|p| p.duration_hours)
        .sum();
    if total_hours > 0.0 {
        content.push_str(&format!("\nTotal study time: {total_hours:.1}h\n"));
    }

    content
}

fn run_export(
    store: &Store,
    args: ExportArgs,
    render: impl Fn(&Store, &ExportFilter, &mut dyn Write) -> sapi::Result<()>,
) -> sapi::Result<()> {
    let subject_id = match &args.subject {
        Some(name) => Some(resolve_subject(store, name)?.id),
        None => None,
    };

    let filter = ExportFilter {
        subject_id,
        from: args.from,
        to: args.to,
    };

    match args.output {
        Some(path) => {
            let mut file = File::create(&path)?;
            render(store, &filter, &mut file)?;
            println!("wrote {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            render(store, &filter, &mut lock)?;
        }
    }

    Ok(())
}

/// Merge the --notes argument with the stored notes: absent keeps the
/// existing value, an empty string clears it.
fn merge_notes(new: Option<String>, existing: Option<String>) -> Option<String> {
    match new {
        Some(n) if n.is_empty() => None,
        Some(n) => Some(n),
        None => existing,
    }
}

fn resolve_subject(store: &Store, name: &str) -> sapi::Result<Subject> {
    store
        .subject_by_name(name)
        .cloned()
        .ok_or(Error::NotFound {
            kind: "subject",
            id: name.to_string(),
        })
}

fn parse_id(id: &str, kind: &'static str) -> sapi::Result<RecordId> {
    Uuid::parse_str(id).map_err(|_| Error::NotFound {
        kind,
        id: id.to_string(),
    })
}
