use super::parse;
use crate::cli::{CliCommand, FamilyArg};
use rulefetch_core::dns::AddrFamily;

#[test]
fn cli_parse_resolve() {
    match parse(&["rulefetch", "resolve", "example.com"]) {
        CliCommand::Resolve { host, family } => {
            assert_eq!(host, "example.com");
            assert_eq!(family, FamilyArg::Any);
        }
        _ => panic!("expected Resolve"),
    }
}

#[test]
fn cli_parse_resolve_family() {
    match parse(&["rulefetch", "resolve", "example.com", "--family", "v6"]) {
        CliCommand::Resolve { family, .. } => {
            assert_eq!(AddrFamily::from(family), AddrFamily::V6);
        }
        _ => panic!("expected Resolve"),
    }
}
