use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input, Select};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::ApiClient;
use crate::cli::Opts;
use crate::context::{own_student, Context};
use crate::render;
use crate::view::{Ticket, ViewState};
use rollbook::api::v1::attendance::AttendanceQuery;
use rollbook::api::v1::auth::{Role, User};
use rollbook::api::v1::students::StudentQuery;
use rollbook::attendance::{parse_date, Month, TOTAL_PERIODS};
use rollbook::sheet::{next_day, previous_day, AttendanceSheet};
use rollbook::student::{RollNumber, YearOfStudy};

/// Take and review attendance.
#[derive(Debug, Parser)]
pub struct Attendance {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Show(Show),
    Mark(Mark),
    Me(Me),
}

/// Show the attendance sheet of a year on a day.
///
/// You need a faculty account.
#[derive(Debug, Clone, Parser)]
struct Show {
    /// The day, as YYYY-MM-DD. Defaults to today.
    #[clap(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// The year of study.
    #[clap(long, default_value = "1")]
    year: YearOfStudy,
}

/// Mark the attendance of a year on a day.
///
/// The sheet starts out as already saved for the day, and every
/// student on it is saved again. Bulk marks are applied first, then
/// each `--set`.
///
/// You need a faculty account.
#[derive(Debug, Clone, Parser)]
struct Mark {
    /// The day, as YYYY-MM-DD. Defaults to today.
    #[clap(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// The year of study.
    #[clap(long, default_value = "1")]
    year: YearOfStudy,

    /// Mark every period of every student present.
    #[clap(long, conflicts_with = "all_absent")]
    all_present: bool,

    /// Mark every period of every student absent.
    #[clap(long)]
    all_absent: bool,

    /// Set how many periods a student was present for.
    ///
    /// The first PERIODS periods are marked present and the rest
    /// absent. Specify this flag multiple times for several students.
    #[clap(long = "set", value_name = "ROLL=PERIODS")]
    sets: Vec<SetPeriods>,

    /// Edit the sheet interactively before saving.
    #[clap(long)]
    interactive: bool,
}

/// Show your own attendance for a month.
///
/// You need a student account.
#[derive(Debug, Clone, Parser)]
struct Me {
    /// The month, from 1 to 12. Defaults to this month.
    #[clap(long)]
    month: Option<u32>,

    /// The calendar year. Defaults to this year.
    #[clap(long)]
    year: Option<i32>,
}

/// A `ROLL=PERIODS` pair.
#[derive(Debug, Clone)]
struct SetPeriods {
    roll_number: RollNumber,
    periods: u8,
}

impl FromStr for SetPeriods {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (roll_number, periods) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected ROLL=PERIODS, got \"{}\"", s))?;

        Ok(Self {
            roll_number: roll_number.trim().parse()?,
            periods: periods.trim().parse()?,
        })
    }
}

/// What the interactive editor is looking at.
#[derive(Debug, Clone, Copy)]
struct Target {
    year: YearOfStudy,
    date: NaiveDate,
}

type Fetched = (Ticket, Result<AttendanceSheet>);

pub async fn run(opts: Opts) -> Result<()> {
    let sub = opts.command.as_attendance().unwrap();
    match &sub.command {
        Command::Show(sub) => show_sheet(sub.to_owned()).await,
        Command::Mark(sub) => mark_sheet(sub.to_owned()).await,
        Command::Me(sub) => show_own(sub.to_owned()).await,
    }
}

async fn show_sheet(sub: Show) -> Result<()> {
    let ctx = Context::load()?;
    ctx.require(Role::Faculty)?;
    let api = ctx.api()?;

    let today = today();
    let date = sub.date.unwrap_or(today);

    let spinner = render::spinner("Fetching attendance");
    let sheet = load_sheet(&api, sub.year, date, today).await;
    spinner.finish_and_clear();

    print!("{}", render::sheet(&sheet?));

    Ok(())
}

async fn mark_sheet(sub: Mark) -> Result<()> {
    let ctx = Context::load()?;
    let user = ctx.require(Role::Faculty)?.clone();
    let api = ctx.api()?;

    let today = today();
    let date = sub.date.unwrap_or(today);

    let spinner = render::spinner("Fetching attendance");
    let sheet = load_sheet(&api, sub.year, date, today).await;
    spinner.finish_and_clear();
    let mut sheet = sheet?;

    if sheet.is_empty() {
        return Err(anyhow!("No students found for year {}.", sub.year));
    }

    if sub.all_present {
        sheet.mark_all_present();
    } else if sub.all_absent {
        sheet.mark_all_absent();
    }

    for set in &sub.sets {
        let student = sheet
            .find_by_roll_number(&set.roll_number)
            .ok_or_else(|| {
                anyhow!(
                    "Student \"{}\" is not in year {}",
                    set.roll_number,
                    sub.year
                )
            })?
            .id
            .clone();
        sheet.set_periods_present(&student, set.periods)?;
    }

    if sub.interactive {
        return edit_interactively(api, user, sheet, today).await;
    }

    print!("{}", render::sheet(&sheet));
    save_sheet(&api, &user, &sheet).await
}

async fn show_own(sub: Me) -> Result<()> {
    let ctx = Context::load()?;
    let user = ctx.require(Role::Student)?;
    let api = ctx.api()?;

    let today = today();
    let month = Month::new(
        sub.month.unwrap_or_else(|| today.month()),
        sub.year.unwrap_or_else(|| today.year()),
    )?;

    let spinner = render::spinner("Fetching attendance");
    let records = async {
        let student = own_student(&api, user).await?;
        api.list_attendance(&AttendanceQuery::of_student_in(student.id, month))
            .await
    }
    .await;
    spinner.finish_and_clear();

    println!("{}", month);
    print!("{}", render::month_report(&records?));

    Ok(())
}

/// Fetches what a sheet is built from.
async fn load_sheet(
    api: &ApiClient,
    year: YearOfStudy,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<AttendanceSheet> {
    let students_query = StudentQuery {
        year_of_study: Some(year),
        ..Default::default()
    };
    let attendance_query = AttendanceQuery::on(date);

    let (students, records) = futures::try_join!(
        api.list_students(&students_query),
        api.list_attendance(&attendance_query),
    )?;

    Ok(AttendanceSheet::new(year, date, today, students, &records)?)
}

async fn save_sheet(api: &ApiClient, user: &User, sheet: &AttendanceSheet) -> Result<()> {
    let spinner = render::spinner("Saving attendance");
    let res = api.save_attendance(&sheet.to_request(&user.id)).await;
    spinner.finish_and_clear();
    res?;

    eprintln!(
        "✅ Saved attendance of {} student(s) for {} ({} present, {} absent)",
        sheet.roster().len(),
        sheet.date(),
        sheet.present_count(),
        sheet.absent_count()
    );

    Ok(())
}

/// Runs the interactive sheet editor.
///
/// Moving to another day or year starts a fetch in the background and
/// the menu comes back right away. Only the sheet of the latest move is
/// ever shown, however the fetches finish.
async fn edit_interactively(
    api: ApiClient,
    user: User,
    sheet: AttendanceSheet,
    today: NaiveDate,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut view: ViewState<Result<AttendanceSheet>> = ViewState::new();
    let mut target = Target {
        year: sheet.year(),
        date: sheet.date(),
    };
    let ticket = view.begin();
    view.apply(ticket, Ok(sheet));
    let mut dirty = true;

    loop {
        drain(&mut view, &mut rx);

        let loaded = view.get().map_or(false, |r| r.is_ok());
        match (view.is_loading(), view.get()) {
            (true, _) => eprintln!("⏳ Loading year {} on {}...", target.year, target.date),
            (false, Some(Ok(sheet))) => eprint!("{}", render::sheet(sheet)),
            (false, Some(Err(e))) => eprintln!("❌ {}", e),
            (false, None) => {}
        }

        let mut actions = Vec::new();
        if view.is_loading() {
            actions.push(Action::Wait);
        } else if loaded {
            actions.extend([
                Action::Toggle,
                Action::SetPeriods,
                Action::AllPresent,
                Action::AllAbsent,
                Action::Save,
            ]);
        }
        actions.extend([
            Action::PreviousDay,
            Action::NextDay,
            Action::GoTo,
            Action::Year,
            Action::Quit,
        ]);

        let labels: Vec<&'static str> = actions.iter().map(Action::label).collect();
        let index = prompt(move || {
            Select::new()
                .with_prompt("What do you want to do?")
                .items(&labels)
                .default(0)
                .interact()
        })
        .await?;

        // Responses that came in while the menu was open
        drain(&mut view, &mut rx);

        let action = actions[index];
        match action {
            Action::Wait => {
                while view.is_loading() {
                    match rx.recv().await {
                        Some((ticket, result)) => {
                            view.apply(ticket, result);
                        }
                        None => break,
                    }
                }
            }
            Action::Toggle | Action::SetPeriods | Action::AllPresent | Action::AllAbsent => {
                let sheet = match editable(&mut view) {
                    Some(sheet) => sheet,
                    None => continue,
                };

                if let Err(e) = edit(sheet, action).await {
                    eprintln!("❌ {}", e);
                } else {
                    dirty = true;
                }
            }
            Action::Save => {
                if save_view(&api, &user, &mut view).await {
                    dirty = false;
                }
            }
            Action::PreviousDay | Action::NextDay | Action::GoTo | Action::Year => {
                let next = match move_target(target, action, today).await {
                    Ok(next) => next,
                    Err(e) => {
                        eprintln!("❌ {}", e);
                        continue;
                    }
                };

                if dirty && !confirm_discard().await? {
                    continue;
                }

                target = next;
                dirty = false;
                spawn_fetch(api.clone(), view.begin(), target, today, tx.clone());
            }
            Action::Quit => {
                if dirty && !confirm_discard().await? {
                    continue;
                }
                return Ok(());
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Wait,
    Toggle,
    SetPeriods,
    AllPresent,
    AllAbsent,
    Save,
    PreviousDay,
    NextDay,
    GoTo,
    Year,
    Quit,
}

impl Action {
    fn label(&self) -> &'static str {
        match self {
            Self::Wait => "Wait for the sheet to load",
            Self::Toggle => "Toggle a period",
            Self::SetPeriods => "Set periods present for a student",
            Self::AllPresent => "Mark all present",
            Self::AllAbsent => "Mark all absent",
            Self::Save => "Save",
            Self::PreviousDay => "Previous day",
            Self::NextDay => "Next day",
            Self::GoTo => "Go to date",
            Self::Year => "Change year",
            Self::Quit => "Quit",
        }
    }
}

fn drain(view: &mut ViewState<Result<AttendanceSheet>>, rx: &mut UnboundedReceiver<Fetched>) {
    while let Ok((ticket, result)) = rx.try_recv() {
        view.apply(ticket, result);
    }
}

/// Saves the sheet of the editor and returns whether it was saved.
///
/// A failed save keeps the sheet as it is.
async fn save_view(
    api: &ApiClient,
    user: &User,
    view: &mut ViewState<Result<AttendanceSheet>>,
) -> bool {
    let sheet = match editable(view) {
        Some(sheet) => sheet,
        None => return false,
    };

    match save_sheet(api, user, sheet).await {
        Ok(()) => true,
        Err(e) => {
            eprintln!("❌ Failed to save attendance: {}", e);
            false
        }
    }
}

/// Returns the sheet if it can be edited right now.
fn editable(view: &mut ViewState<Result<AttendanceSheet>>) -> Option<&mut AttendanceSheet> {
    if view.is_loading() {
        eprintln!("⏳ The sheet is still loading. Changes are not possible until it has loaded.");
        return None;
    }

    view.get_mut().and_then(|r| r.as_mut().ok())
}

async fn edit(sheet: &mut AttendanceSheet, action: Action) -> Result<()> {
    match action {
        Action::AllPresent => sheet.mark_all_present(),
        Action::AllAbsent => sheet.mark_all_absent(),
        Action::Toggle => {
            let student = select_student(sheet).await?;
            let period: u8 = prompt(|| {
                Input::new()
                    .with_prompt(format!("Period (1-{})", TOTAL_PERIODS))
                    .interact_text()
            })
            .await?;
            sheet.toggle(&student, period)?;
        }
        Action::SetPeriods => {
            let student = select_student(sheet).await?;
            let count: u8 = prompt(|| {
                Input::new()
                    .with_prompt(format!("Periods present (0-{})", TOTAL_PERIODS))
                    .interact_text()
            })
            .await?;
            sheet.set_periods_present(&student, count)?;
        }
        _ => {}
    }

    Ok(())
}

async fn select_student(sheet: &AttendanceSheet) -> Result<rollbook::id::RecordId> {
    let (ids, labels): (Vec<_>, Vec<_>) = sheet
        .entries()
        .map(|(student, row)| {
            (
                student.id.clone(),
                format!("{:<14} {}", student.roll_number.as_str(), row.status()),
            )
        })
        .unzip();

    let index = prompt(move || {
        Select::new()
            .with_prompt("Student")
            .items(&labels)
            .default(0)
            .interact()
    })
    .await?;

    Ok(ids[index].clone())
}

async fn move_target(target: Target, action: Action, today: NaiveDate) -> Result<Target> {
    let mut next = target;

    match action {
        Action::PreviousDay => next.date = previous_day(target.date),
        Action::NextDay => next.date = next_day(target.date, today)?,
        Action::GoTo => {
            let date: String = prompt(|| {
                Input::new()
                    .with_prompt("Date (YYYY-MM-DD)")
                    .interact_text()
            })
            .await?;
            let date = parse_date(&date)?;
            if date > today {
                return Err(anyhow!(
                    "Attendance cannot be taken for {}, which is after {}",
                    date,
                    today
                ));
            }
            next.date = date;
        }
        Action::Year => {
            let years: Vec<YearOfStudy> = YearOfStudy::all().collect();
            let labels: Vec<String> = years.iter().map(|y| format!("Year {}", y)).collect();
            let index = prompt(move || {
                Select::new()
                    .with_prompt("Year of study")
                    .items(&labels)
                    .interact()
            })
            .await?;
            next.year = years[index];
        }
        _ => {}
    }

    Ok(next)
}

fn spawn_fetch(
    api: ApiClient,
    ticket: Ticket,
    target: Target,
    today: NaiveDate,
    tx: UnboundedSender<Fetched>,
) {
    tokio::spawn(async move {
        let result = load_sheet(&api, target.year, target.date, today).await;

        // The editor may have quit already
        let _ = tx.send((ticket, result));
    });
}

async fn confirm_discard() -> Result<bool> {
    prompt(|| {
        Confirm::new()
            .with_prompt("Discard unsaved changes?")
            .default(false)
            .interact()
    })
    .await
}

/// Runs a blocking prompt without stalling background fetches.
async fn prompt<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> std::io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::ServerConfig;
    use rollbook::student::Student;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    fn sheet_on(date: NaiveDate) -> AttendanceSheet {
        let students: Vec<Student> = vec![serde_json::from_value(serde_json::json!({
            "_id": "s1",
            "roll_number": "21CS001",
            "year_of_study": 1,
        }))
        .unwrap()];

        AttendanceSheet::new(YearOfStudy::new(1).unwrap(), date, day(10), students, &[]).unwrap()
    }

    fn rows(view: &ViewState<Result<AttendanceSheet>>) -> Vec<Vec<bool>> {
        let sheet = view.get().unwrap().as_ref().unwrap();
        sheet.entries().map(|(_, row)| row.periods().to_vec()).collect()
    }

    fn faculty() -> User {
        serde_json::from_value(serde_json::json!({
            "_id": "f1",
            "email": "faculty@example.com",
            "role": "faculty",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_failed_save_keeps_sheet() {
        // Nothing listens on the discard port
        let api = ApiClient::from_server_config(&ServerConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
        })
        .unwrap();
        let user = faculty();

        let mut sheet = sheet_on(day(3));
        sheet.set_periods_present(&"s1".parse().unwrap(), 4).unwrap();

        let mut view = ViewState::new();
        let ticket = view.begin();
        view.apply(ticket, Ok(sheet));
        let before = rows(&view);

        assert!(!save_view(&api, &user, &mut view).await);
        assert_eq!(before, rows(&view));

        assert!(editable(&mut view).is_some());
        assert!(!save_view(&api, &user, &mut view).await);
        assert_eq!(before, rows(&view));
    }

    #[tokio::test]
    async fn test_editor_drops_stale_sheets() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut view: ViewState<Result<AttendanceSheet>> = ViewState::new();

        let monday = view.begin();
        let tuesday = view.begin();

        // The older fetch finishes last
        tx.send((tuesday, Ok(sheet_on(day(3))))).unwrap();
        tx.send((monday, Ok(sheet_on(day(2))))).unwrap();
        drain(&mut view, &mut rx);

        assert!(!view.is_loading());
        assert_eq!(day(3), view.get().unwrap().as_ref().unwrap().date());

        // Nothing can be edited or saved while a newer fetch is pending
        let wednesday = view.begin();
        tx.send((tuesday, Ok(sheet_on(day(2))))).unwrap();
        drain(&mut view, &mut rx);
        assert!(view.is_loading());
        assert!(editable(&mut view).is_none());

        tx.send((wednesday, Ok(sheet_on(day(4))))).unwrap();
        drain(&mut view, &mut rx);
        assert_eq!(day(4), view.get().unwrap().as_ref().unwrap().date());
        assert!(editable(&mut view).is_some());
    }

    #[test]
    fn test_parse_set_periods() {
        let set: SetPeriods = "21CS001=4".parse().unwrap();
        assert_eq!("21CS001", set.roll_number.as_str());
        assert_eq!(4, set.periods);

        let spaced: SetPeriods = " 21CS002 = 0 ".parse().unwrap();
        assert_eq!("21CS002", spaced.roll_number.as_str());
        assert_eq!(0, spaced.periods);

        "21CS001".parse::<SetPeriods>().unwrap_err();
        "21CS001=many".parse::<SetPeriods>().unwrap_err();
        "=3".parse::<SetPeriods>().unwrap_err();
    }

    #[tokio::test]
    async fn test_move_target() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
        let target = Target {
            year: YearOfStudy::new(2).unwrap(),
            date: today,
        };

        let previous = move_target(target, Action::PreviousDay, today)
            .await
            .unwrap();
        assert_eq!(NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(), previous.date);
        assert_eq!(target.year, previous.year);

        move_target(target, Action::NextDay, today)
            .await
            .unwrap_err();

        let back = move_target(previous, Action::NextDay, today)
            .await
            .unwrap();
        assert_eq!(today, back.date);
    }
}
