//! Host selection against a realistic inventory.

use ansibleconnect::filter::{parse_groups, parse_hostnames, parse_vars, select_hosts, HostFilter};
use ansibleconnect::inventory::Inventory;
use std::path::Path;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/inventory.yml");

fn inventory() -> Inventory {
    Inventory::load(Path::new(FIXTURE)).unwrap()
}

fn filter(groups: Option<&str>, vars: &[&str], novars: &[&str]) -> HostFilter {
    HostFilter {
        groups: parse_groups(groups),
        include_vars: parse_vars(vars),
        exclude_vars: parse_vars(novars),
    }
}

fn count(groups: Option<&str>, vars: &[&str], novars: &[&str]) -> usize {
    let inventory = inventory();
    select_hosts(&inventory, &[], &filter(groups, vars, novars)).len()
}

#[test]
fn test_fixture_loads_every_host() {
    let inventory = inventory();
    assert_eq!(inventory.len(), 8);
    assert_eq!(count(None, &[], &[]), 8);
}

#[test]
fn test_select_single_group() {
    assert_eq!(count(Some("groupA"), &[], &[]), 3);
}

#[test]
fn test_select_through_children() {
    assert_eq!(count(Some("groupB"), &[], &[]), 4);
    assert_eq!(count(Some("groupB:!groupD"), &[], &[]), 1);
}

#[test]
fn test_exclude_only() {
    assert_eq!(count(Some("!groupA"), &[], &[]), 5);
}

#[test]
fn test_var_with_value() {
    assert_eq!(count(None, &["deploy:true"], &[]), 2);
    assert_eq!(count(None, &[], &["deploy:true"]), 6);
    assert_eq!(count(None, &["deploy:false"], &[]), 1);
}

#[test]
fn test_var_presence() {
    assert_eq!(count(None, &["myname"], &[]), 3);
    assert_eq!(count(None, &[], &["myname"]), 5);
}

#[test]
fn test_several_vars_match_any() {
    assert_eq!(count(None, &["myname:Dhost1,hostvar"], &[]), 4);
    assert_eq!(count(None, &["myname:Dhost1", "hostvar"], &[]), 4);
    assert_eq!(count(None, &[], &["myname:Dhost1,hostvar"]), 4);
}

#[test]
fn test_vars_include_and_exclude() {
    assert_eq!(count(None, &["deploy:true"], &["myname:Dhost1"]), 1);
    assert_eq!(count(None, &["hostvar"], &["hostvar:test"]), 1);
}

#[test]
fn test_groups_and_vars_combined() {
    let inventory = inventory();
    let selected = select_hosts(&inventory, &[], &filter(Some("groupB"), &["deploy:true"], &[]));
    let names: Vec<&str> = selected.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, ["10.0.0.4"]);
}

#[test]
fn test_unknown_group_selects_nothing() {
    assert_eq!(count(Some("nosuchgroup"), &[], &[]), 0);
}

#[test]
fn test_hostnames_keep_given_order() {
    let inventory = inventory();
    let hostnames = parse_hostnames(Some("db01,10.0.0.5,unknown,db01"));
    let selected = select_hosts(&inventory, &hostnames, &HostFilter::default());
    let names: Vec<&str> = selected.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, ["db01", "10.0.0.5"]);
}

#[test]
fn test_hostnames_still_honour_vars() {
    let inventory = inventory();
    let hostnames = parse_hostnames(Some("10.0.0.5,172.16.0.30"));
    let selected = select_hosts(&inventory, &hostnames, &filter(None, &["deploy"], &[]));
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].name, "10.0.0.5");
}

#[test]
fn test_membership_is_inherited() {
    let inventory = inventory();
    let host = inventory.host("172.16.0.8").unwrap();
    assert!(host.in_group("groupD"));
    assert!(host.in_group("groupB"));
    assert!(host.in_group("all"));
    assert!(!host.in_group("groupA"));
}
