//! Domain and port changes across the whole fleet.

mod common;

use common::TestEnv;
use valet::sites::SiteMode;

#[test]
fn test_domain_change_moves_isolated_secured_site() {
    let env = TestEnv::new();
    env.park("site1");
    env.engine.reconciler.secure("site1").unwrap();
    env.engine.reconciler.on_isolate("site1", "7.4", false).unwrap();

    let change = env.engine.reconciler.on_domain_change("dev").unwrap();

    assert_eq!(change.previous, "test");
    assert_eq!(change.current, "dev");
    assert_eq!(change.reissued, vec!["site1.dev".to_string()]);
    assert_eq!(
        change.renamed,
        vec![("site1.test".to_string(), "site1.dev".to_string())]
    );

    assert!(!env.cert_exists("site1.test"));
    assert!(env.cert_exists("site1.dev"));
    assert!(!env.site_file("site1.test").exists());

    let content = env.read_site("site1.dev");
    assert!(content.starts_with("# valet stub: secure.isolated.valet.conf\n"));
    assert!(content.contains("# ISOLATED_PHP_VERSION=7.4"));
    assert!(content.contains("server_name site1.dev"));
    assert!(content.contains("Certificates/site1.dev.crt"));

    assert_eq!(env.engine.config.read().unwrap().domain, "dev");
}

#[test]
fn test_domain_change_moves_plain_secured_and_proxy_sites() {
    let env = TestEnv::new();
    env.park("blog");
    env.engine.reconciler.secure("blog").unwrap();
    env.engine
        .reconciler
        .proxy("api", "localhost:3000", false)
        .unwrap();

    env.engine.reconciler.on_domain_change(".Local").unwrap();

    let blog = env.engine.sites.derive("blog.local").unwrap().unwrap();
    assert_eq!(blog.mode, SiteMode::Plain);
    assert!(blog.secured);
    let api = env.engine.sites.derive("api.local").unwrap().unwrap();
    assert!(!api.secured);
    assert_eq!(
        api.mode,
        SiteMode::Proxy {
            upstream: "http://localhost:3000".to_string()
        }
    );
    assert!(env.engine.sites.derive("blog.test").unwrap().is_none());
    assert!(env.engine.sites.derive("api.test").unwrap().is_none());
}

#[test]
fn test_same_domain_changes_nothing() {
    let env = TestEnv::new();

    let change = env.engine.reconciler.on_domain_change("test").unwrap();

    assert!(change.reissued.is_empty());
    assert!(change.renamed.is_empty());
    assert!(env.services.calls().is_empty());
}

#[test]
fn test_invalid_domain_is_rejected() {
    let env = TestEnv::new();

    assert!(env.engine.reconciler.on_domain_change("").is_err());
    assert!(env.engine.reconciler.on_domain_change("bad..tld").is_err());
    assert!(env.engine.reconciler.on_domain_change("*.dev").is_err());
    assert_eq!(env.engine.config.read().unwrap().domain, "test");
}

#[test]
fn test_port_changes_rewrite_every_file() {
    let env = TestEnv::new();
    env.park("a");
    env.park("b");
    env.engine.reconciler.secure("a").unwrap();
    env.engine.reconciler.on_isolate("b", "7.4", false).unwrap();

    env.engine.reconciler.on_port_change(8080, false).unwrap();
    env.engine.reconciler.on_port_change(4443, true).unwrap();

    let a = env.read_site("a.test");
    assert!(a.contains("listen 8080;"));
    assert!(a.contains("listen 4443 ssl;"));
    assert!(a.contains("https://$host:4443$request_uri"));

    let b = env.read_site("b.test");
    assert!(b.contains("listen 8080;"));
    assert!(!b.contains("ssl"));
    assert!(b.starts_with("# valet stub: isolated.valet.conf\n"));
    assert!(b.contains("# ISOLATED_PHP_VERSION=7.4"));
    let b = env.engine.sites.derive("b.test").unwrap().unwrap();
    assert_eq!(
        b.mode,
        SiteMode::Isolated {
            php_version: "7.4".to_string()
        }
    );

    assert!(env.catch_all().contains("listen 8080 default_server;"));

    let config = env.engine.config.read().unwrap();
    assert_eq!(config.port, 8080);
    assert_eq!(config.https_port, 4443);
}

#[test]
fn test_port_zero_is_rejected() {
    let env = TestEnv::new();

    assert!(env.engine.reconciler.on_port_change(0, false).is_err());
    assert_eq!(env.engine.config.read().unwrap().port, 80);
}

#[test]
fn test_link_and_unlink() {
    let env = TestEnv::new();
    let project = tempfile::tempdir().unwrap();

    let (linked, host) = env
        .engine
        .reconciler
        .link("portal", project.path(), true)
        .unwrap();

    assert_eq!(host, "portal.test");
    assert_eq!(linked.name, "portal");
    assert!(env.engine.ca.is_secured("portal.test"));
    let links = env.engine.sites.links().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].path, project.path());

    assert!(env.engine.reconciler.unlink("portal").unwrap());
    assert!(!env.cert_exists("portal.test"));
    assert!(env.engine.sites.links().unwrap().is_empty());
    assert!(!env.engine.reconciler.unlink("portal").unwrap());
}
