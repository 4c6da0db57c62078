mod common;

use anyhow::Result;
use common::*;
use nestql::parser::parse_query_string;
use nestql::ResolverConfig;
use nestql_sqlite::SqliteQuery;

fn run(query_string: &str, model: &str, config: ResolverConfig) -> Result<Vec<i64>> {
    let conn = database()?;
    let resolver = resolver(config);
    let request = parse_query_string(query_string, &resolver.config().root_key)?;

    let mut query = SqliteQuery::new(&conn, resolver.schema(), model);
    resolver.apply_request(&mut query, &request)?;
    keys(&query)
}

#[test]
fn test_nested_filters_from_query_string() -> Result<()> {
    assert_eq!(run("?filters[author][name][$eq]=Ada&filters[views][$gt]=10&page=2", "post", ResolverConfig::strict())?, vec![1]);
    assert_eq!(run("filters[views][$between][]=10&filters[views][$between][]=100", "post", ResolverConfig::strict())?, vec![2]);
    assert_eq!(run("filters[commentable][duration][$lt]=100", "comment", ResolverConfig::strict())?, vec![5]);
    Ok(())
}

#[test]
fn test_encoded_values() -> Result<()> {
    assert_eq!(run("filters%5Btitle%5D%5B%24contains%5D=100%25+off", "post", ResolverConfig::strict())?, vec![3]);
    assert_eq!(run("filters[title][$in][]=SQL+joins&filters[title][$in][]=Rust+ownership", "post", ResolverConfig::strict())?, vec![1, 2]);
    Ok(())
}

#[test]
fn test_custom_root_key() -> Result<()> {
    let config = ResolverConfig { root_key: "where".into(), ..ResolverConfig::strict() };
    assert_eq!(run("where[slug][$eqc]=ABC&filters[slug][$eqc]=abc", "post", config)?, vec![2]);
    Ok(())
}

#[test]
fn test_invalid_filters_from_query_string() -> Result<()> {
    assert!(run("filters[password][$eq]=x", "user", ResolverConfig::strict()).is_err());
    assert_eq!(run("filters[password][$eq]=x&filters[name][$startsWith]=G", "user", ResolverConfig::silent())?, vec![2]);
    Ok(())
}
