use super::*;

use crate::id::tests::id;
use crate::subject::tests::subject;

fn mark(id: &str, student: &str, subject: &str, exam_type: &str, obtained: f64, total: f64) -> Mark {
    serde_json::from_value(serde_json::json!({
        "_id": id,
        "student_id": student,
        "subject_id": subject,
        "semester": 1,
        "exam_type": exam_type,
        "marks_obtained": obtained,
        "total_marks": total,
        "academic_year": "2025-26",
        "subject_name": format!("{} name", subject),
    }))
    .unwrap()
}

fn subjects() -> Vec<Subject> {
    vec![subject!("maths", "theory"), subject!("chem-lab", "lab")]
}

#[test]
fn test_combine_theory_pair() {
    let marks = vec![
        mark("m1", "s1", "maths", "unit_test_internal", 40.0, 50.0),
        mark("m2", "s1", "maths", "unit_test_external", 35.0, 50.0),
    ];

    let lines = combine(&marks, &subjects(), &MarksView::default());
    assert_eq!(1, lines.len());

    let line = &lines[0];
    assert!(line.combined);
    assert!(!line.is_deletable());
    assert_eq!(75.0, line.mark.marks_obtained);
    assert_eq!(100.0, line.mark.total_marks);
    assert_eq!(
        Some("maths name (Theory - Combined)"),
        line.mark.subject_name.as_deref()
    );

    // source is untouched
    assert_eq!(40.0, marks[0].marks_obtained);
    assert_eq!(50.0, marks[0].total_marks);
}

#[test]
fn test_combine_rounds_to_tenth() {
    let marks = vec![
        mark("m1", "s1", "maths", "unit_test_internal", 13.0, 20.0),
        mark("m2", "s1", "maths", "unit_test_external", 50.0, 80.0),
        mark("m3", "s1", "maths", "unit_test_external", 1.0, 3.0),
    ];

    let lines = combine(&marks, &subjects(), &MarksView::default());
    assert_eq!(1, lines.len());
    // 64 / 103
    assert_eq!(62.1, lines[0].mark.marks_obtained);
}

#[test]
fn test_singles_pass_through() {
    let marks = vec![
        mark("m1", "s1", "chem-lab", "lab_internal", 18.0, 20.0),
        mark("m2", "s1", "maths", "unit_test_internal", 15.0, 20.0),
    ];

    let lines = combine(&marks, &subjects(), &MarksView::default());
    assert_eq!(2, lines.len());
    for (line, mark) in lines.iter().zip(marks.iter()) {
        assert!(!line.combined);
        assert_eq!(mark, &line.mark);
    }
}

#[test]
fn test_lab_and_unknown_subjects_are_never_combined() {
    let marks = vec![
        mark("m1", "s1", "chem-lab", "lab_internal", 18.0, 20.0),
        mark("m2", "s1", "chem-lab", "lab_internal", 30.0, 40.0),
        mark("m3", "s1", "unknown", "unit_test_internal", 5.0, 10.0),
        mark("m4", "s1", "unknown", "unit_test_external", 5.0, 10.0),
    ];

    let lines = combine(&marks, &subjects(), &MarksView::default());
    assert_eq!(4, lines.len());
    assert!(lines.iter().all(|l| !l.combined));
}

#[test]
fn test_groups_by_student_and_subject() {
    let marks = vec![
        mark("m1", "s1", "maths", "unit_test_internal", 10.0, 20.0),
        mark("m2", "s2", "maths", "unit_test_internal", 20.0, 20.0),
        mark("m3", "s1", "chem-lab", "lab_external", 30.0, 40.0),
        mark("m4", "s1", "maths", "unit_test_external", 40.0, 80.0),
    ];

    let lines = combine(&marks, &subjects(), &MarksView::default());
    let summary: Vec<(&str, bool)> = lines
        .iter()
        .map(|l| (l.mark.id.as_str(), l.combined))
        .collect();

    assert_eq!(vec![("m1", true), ("m2", false), ("m3", false)], summary);
    assert_eq!(50.0, lines[0].mark.marks_obtained);
}

#[test]
fn test_selected_student_or_lab_filter_is_unmodified() {
    let marks = vec![
        mark("m1", "s1", "maths", "unit_test_internal", 40.0, 50.0),
        mark("m2", "s1", "maths", "unit_test_external", 35.0, 50.0),
    ];

    let by_student = MarksView {
        subject_type: SubjectFilter::All,
        student: Some(id!("s1")),
    };
    let lab = MarksView {
        subject_type: SubjectFilter::Lab,
        student: None,
    };

    for view in [by_student, lab] {
        let lines = combine(&marks, &subjects(), &view);
        assert_eq!(2, lines.len());
        assert!(lines.iter().all(|l| !l.combined));
    }
}

#[test]
fn test_combine_is_idempotent() {
    let marks = vec![
        mark("m1", "s1", "maths", "unit_test_internal", 40.0, 50.0),
        mark("m2", "s1", "maths", "unit_test_external", 35.0, 50.0),
        mark("m3", "s2", "chem-lab", "lab_internal", 35.0, 50.0),
    ];
    let view = MarksView::default();

    assert_eq!(
        combine(&marks, &subjects(), &view),
        combine(&marks, &subjects(), &view)
    );
}

#[test]
fn test_filter_by_subject_type() {
    let marks = vec![
        mark("m1", "s1", "maths", "unit_test_internal", 40.0, 50.0),
        mark("m2", "s1", "chem-lab", "lab_internal", 35.0, 50.0),
        mark("m3", "s1", "unknown", "lab_internal", 35.0, 50.0),
    ];

    let ids = |marks: Vec<Mark>| -> Vec<String> {
        marks.into_iter().map(|m| m.id.to_string()).collect()
    };

    assert_eq!(
        vec!["m1"],
        ids(filter_by_subject_type(marks.clone(), &subjects(), SubjectFilter::Theory))
    );
    assert_eq!(
        vec!["m2"],
        ids(filter_by_subject_type(marks.clone(), &subjects(), SubjectFilter::Lab))
    );
    assert_eq!(
        3,
        filter_by_subject_type(marks, &subjects(), SubjectFilter::All).len()
    );
}

#[test]
fn test_validate_marks() {
    validate_marks(0.0, 100.0).unwrap();
    validate_marks(100.0, 100.0).unwrap();

    let err = validate_marks(101.0, 100.0).unwrap_err();
    assert_eq!("MarksExceedTotal", err.name());
    assert_eq!(
        "Marks obtained (101) cannot exceed total marks (100)",
        err.to_string()
    );

    validate_marks(-1.0, 100.0).unwrap_err();
    validate_marks(10.0, 0.0).unwrap_err();
    validate_marks(f64::NAN, 100.0).unwrap_err();
}

#[test]
fn test_mark_form() {
    let subjects = subjects();
    let form = MarkForm {
        student_id: id!("s1"),
        semester: Semester::new(1).unwrap(),
        marks_obtained: 18.0,
        total_marks: 20.0,
        academic_year: None,
    };

    let theory = form
        .clone()
        .into_request(&subjects[0], &id!("f1"))
        .unwrap();
    assert_eq!(ExamType::UnitTestInternal, theory.exam_type);
    assert_eq!(DEFAULT_ACADEMIC_YEAR, theory.academic_year);

    let lab = form.clone().into_request(&subjects[1], &id!("f1")).unwrap();
    assert_eq!(ExamType::LabInternal, lab.exam_type);

    let json = serde_json::to_value(&lab).unwrap();
    assert_eq!("lab_internal", json["exam_type"]);
    assert_eq!("f1", json["entered_by"]);

    let mut too_many = form.clone();
    too_many.marks_obtained = 21.0;
    too_many.into_request(&subjects[0], &id!("f1")).unwrap_err();

    let mut wrong_semester = form;
    wrong_semester.semester = Semester::new(2).unwrap();
    wrong_semester
        .into_request(&subjects[0], &id!("f1"))
        .unwrap_err();
}

#[test]
fn test_student_views() {
    let marks = vec![
        mark("m1", "s1", "chem-lab", "lab_external", 30.0, 40.0),
        mark("m2", "s1", "maths", "unit_test_internal", 10.0, 20.0),
        mark("m3", "s1", "chem-lab", "lab_internal", 20.0, 40.0),
    ];
    let mut with_assignment = marks.clone();
    with_assignment.push(mark("m4", "s1", "maths", "assignment", 8.0, 10.0));

    let groups: Vec<(ExamType, usize)> = group_by_exam_type(&marks)
        .into_iter()
        .map(|(t, g)| (t, g.len()))
        .collect();
    assert_eq!(
        vec![
            (ExamType::UnitTestInternal, 1),
            (ExamType::LabInternal, 1),
            (ExamType::LabExternal, 1),
        ],
        groups
    );

    assert_eq!(ExamType::Other, with_assignment[3].exam_type);
    let last = group_by_exam_type(&with_assignment).pop().unwrap();
    assert_eq!(ExamType::Other, last.0);
    assert_eq!("m4", last.1[0].id.as_str());

    // 60 / 100
    assert_eq!(60, overall_percentage(&marks));
    // (75 + 50 + 50) / 3
    assert_eq!(58, average_percentage(&marks));
    assert_eq!(0, overall_percentage(&[]));
    assert_eq!(0, average_percentage(&[]));

    assert_eq!(Grade::Good, Grade::of(75));
    assert_eq!(Grade::Fair, Grade::of(50));
    assert_eq!(Grade::Poor, Grade::of(49));
}
