use super::*;

use crate::id::tests::id;

fn record(day: u32, status: &str) -> AttendanceRecord {
    serde_json::from_value(serde_json::json!({
        "_id": format!("r{}", day),
        "student_id": "s1",
        "date": format!("2025-03-{:02}", day),
        "month": 3,
        "year": 2025,
        "status": status,
    }))
    .unwrap()
}

#[test]
fn test_status_thresholds() {
    let expected = [
        DayStatus::Absent,
        DayStatus::Absent,
        DayStatus::Absent,
        DayStatus::Absent,
        DayStatus::Half,
        DayStatus::Full,
        DayStatus::Full,
        DayStatus::Full,
    ];

    for (periods, status) in expected.iter().enumerate() {
        assert_eq!(*status, DayStatus::from_periods(periods as u8));
    }
}

#[test]
fn test_status_labels() {
    for status in [DayStatus::Absent, DayStatus::Half, DayStatus::Full] {
        assert_eq!(status, DayStatus::from_label(status.label()));

        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(status, serde_json::from_str::<DayStatus>(&json).unwrap());
    }

    assert_eq!(DayStatus::Absent, DayStatus::from_label("present"));
    assert_eq!(DayStatus::Absent, DayStatus::from_label(""));
    assert_eq!(
        DayStatus::Absent,
        serde_json::from_str::<DayStatus>("null").unwrap()
    );
}

#[test]
fn test_percentage() {
    assert_eq!(0, percentage(0, 0));
    assert_eq!(0, percentage(5, 0));
    assert_eq!(100, percentage(3, 3));
    assert_eq!(67, percentage(2, 3));
    assert_eq!(33, percentage(1, 3));
    assert_eq!(50, percentage(1, 2));

    for total in 1..40 {
        let mut last = 0;
        for present in 0..=total {
            let p = percentage(present, total);
            assert!(p >= last, "{}/{} dropped below {}", present, total, last);
            last = p;
        }
        assert_eq!(100, last);
    }
}

#[test]
fn test_summary() {
    let records = vec![
        record(1, "Present"),
        record(2, "Half Day"),
        record(3, "Absent"),
        record(4, "whatever"),
    ];

    let summary = AttendanceSummary::from_records(&records);
    assert_eq!(
        AttendanceSummary {
            total_days: 4,
            present_days: 2,
            absent_days: 2,
            percentage: 50,
        },
        summary
    );

    assert_eq!(
        AttendanceSummary::default(),
        AttendanceSummary::from_records(&[])
    );
}

#[test]
fn test_month_halves() {
    let records = vec![
        record(3, "Present"),
        record(16, "Absent"),
        record(15, "Half Day"),
        record(31, "Present"),
    ];

    let halves = MonthHalves::split(&records);
    let first: Vec<u32> = halves.first.iter().map(|r| r.day()).collect();
    let second: Vec<u32> = halves.second.iter().map(|r| r.day()).collect();

    assert_eq!(vec![3, 15], first);
    assert_eq!(vec![16, 31], second);
    assert_eq!(2, halves.window(ReportingWindow::SecondHalf).len());

    let empty = MonthHalves::split(&[]);
    assert!(empty.first.is_empty() && empty.second.is_empty());
}

#[test]
fn test_reporting_window() {
    assert_eq!(ReportingWindow::FirstHalf, ReportingWindow::for_day(1));
    assert_eq!(ReportingWindow::FirstHalf, ReportingWindow::for_day(15));
    assert_eq!(ReportingWindow::SecondHalf, ReportingWindow::for_day(16));
    assert_eq!("Part 2 (16-30/31)", ReportingWindow::for_day(30).label());
}

#[test]
fn test_deserialize_record() {
    let json = r#"{
        "_id": "r1",
        "student_id": { "_id": "s1", "roll_number": "CS01" },
        "date": "2025-03-14T00:00:00.000Z",
        "month": 3,
        "year": 2025
    }"#;

    let record: AttendanceRecord = serde_json::from_str(json).unwrap();
    assert_eq!(id!("s1"), record.student_id);
    assert_eq!(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(), record.date);
    assert_eq!(0, record.periods_present);
    assert_eq!(TOTAL_PERIODS, record.total_periods);
    assert_eq!(DayStatus::Absent, record.status);

    serde_json::from_str::<AttendanceRecord>(r#"{ "student_id": "s1", "date": "14/03/2025" }"#)
        .unwrap_err();
}

#[test]
fn test_new_record() {
    let date = NaiveDate::from_ymd_opt(2025, 11, 4).unwrap();
    let record = AttendanceRecord::new(id!("s1"), date, 4, Some(id!("f1"))).unwrap();

    assert_eq!(DayStatus::Half, record.status);
    assert_eq!(11, record.month);
    assert_eq!(2025, record.year);

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!("2025-11-04", json["date"]);
    assert_eq!("Half Day", json["status"]);
    assert_eq!("f1", json["marked_by"]);
    assert!(json.get("id").is_none());

    AttendanceRecord::new(id!("s1"), date, 8, None).unwrap_err();
}

#[test]
fn test_month() {
    let month = Month::new(2, 2026).unwrap();
    assert_eq!("February 2026", month.to_string());
    Month::new(0, 2026).unwrap_err();
    Month::new(13, 2026).unwrap_err();

    assert_eq!(
        NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        parse_date("2026-01-31").unwrap()
    );
    parse_date("2026-02-30").unwrap_err();
}
