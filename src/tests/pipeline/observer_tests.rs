use crate::pipeline::LogObserver;

#[test]
fn final_count_logged_only_when_not_already_reported() {
    let observer = LogObserver::default();
    assert!(observer.reports_final_count(250));
    assert!(!observer.reports_final_count(200));
}

#[test]
fn custom_interval_changes_which_counts_repeat() {
    let observer = LogObserver::new(50);
    assert!(!observer.reports_final_count(150));
    assert!(observer.reports_final_count(175));
}

#[test]
fn disabled_progress_always_reports_final_count() {
    let observer = LogObserver::new(0);
    assert!(observer.reports_final_count(100));
}
