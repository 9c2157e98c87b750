use std::collections::BTreeMap;

use cfgtree::{
    Convert,
    convert::{LanguageTag, TypeDescriptor},
    mapper::{Fields, Section},
};
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}
cfgtree::enum_symbols!(LogLevel {
    Error,
    Warn,
    Info,
    Debug
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tls {
    pub enabled: bool,
    pub cert_file: String,
}

impl Section for Tls {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("enabled", |s| &s.enabled, |s| &mut s.enabled);
        fields
            .field("certFile", |s| &s.cert_file, |s| &mut s.cert_file)
            .comment("PEM encoded certificate chain");
    }
}

/// A section used as a list element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Endpoint {
    pub url: String,
    pub weight: u32,
}

impl Section for Endpoint {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("url", |s| &s.url, |s| &mut s.url);
        fields.field("weight", |s| &s.weight, |s| &mut s.weight);
    }
}

impl Convert for Endpoint {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::section::<Self>()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub level: LogLevel,
    pub tags: Vec<String>,
    pub limits: BTreeMap<String, u32>,
    pub tls: Tls,
    pub backup: Option<Tls>,
    pub id: Uuid,
    pub locale: LanguageTag,
    pub started: Option<DateTime<Utc>>,
    pub upstreams: Vec<Endpoint>,
    pub ratio: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            level: LogLevel::default(),
            tags: Vec::new(),
            limits: BTreeMap::new(),
            tls: Tls::default(),
            backup: None,
            id: Uuid::nil(),
            locale: LanguageTag::new("en").with_country("US"),
            started: None,
            upstreams: Vec::new(),
            ratio: 0.5,
        }
    }
}

impl Section for ServerConfig {
    fn describe(fields: &mut Fields<Self>) {
        fields
            .field("host", |s| &s.host, |s| &mut s.host)
            .comment("Interface to bind");
        fields.field("port", |s| &s.port, |s| &mut s.port);
        fields.field("logLevel", |s| &s.level, |s| &mut s.level);
        fields.field("tags", |s| &s.tags, |s| &mut s.tags);
        fields
            .field("limits", |s| &s.limits, |s| &mut s.limits)
            .map_comment("connections", ["Maximum open connections"]);
        fields.section("tls", |s| &s.tls, |s| &mut s.tls);
        fields.optional_section("backup", |s| &s.backup, |s| &mut s.backup);
        fields.field("id", |s| &s.id, |s| &mut s.id);
        fields.field("locale", |s| &s.locale, |s| &mut s.locale);
        fields
            .field("started", |s| &s.started, |s| &mut s.started)
            .path("runtime.startedAt");
        fields.field("upstreams", |s| &s.upstreams, |s| &mut s.upstreams);
        fields.property("ratio", |s| s.ratio, ServerConfig::set_ratio);
    }
}

impl ServerConfig {
    pub fn set_ratio(&mut self, ratio: f64) -> Result<(), String> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(format!("ratio {ratio} is outside 0..=1"));
        }
        self.ratio = ratio;
        Ok(())
    }

    /// An instance with every field away from its default.
    pub fn populated() -> Self {
        let mut limits = BTreeMap::new();
        limits.insert("connections".to_string(), 512);
        limits.insert("requests".to_string(), 10_000);
        Self {
            host: "0.0.0.0".to_string(),
            port: 443,
            level: LogLevel::Debug,
            tags: vec!["edge".to_string(), "eu".to_string()],
            limits,
            tls: Tls {
                enabled: true,
                cert_file: "/etc/certs/server.pem".to_string(),
            },
            backup: Some(Tls {
                enabled: false,
                cert_file: "/etc/certs/backup.pem".to_string(),
            }),
            id: Uuid::new_v4(),
            locale: LanguageTag::new("de").with_country("AT"),
            started: Some(Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap()),
            upstreams: vec![
                Endpoint {
                    url: "http://a.internal".to_string(),
                    weight: 3,
                },
                Endpoint {
                    url: "http://b.internal".to_string(),
                    weight: 1,
                },
            ],
            ratio: 0.25,
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Common {
    pub name: String,
}

impl Section for Common {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("name", |s| &s.name, |s| &mut s.name);
    }
}

/// Declares its own field before the base on purpose; base fields still
/// map first.
#[derive(Debug, Default, PartialEq)]
pub struct Worker {
    pub threads: u32,
    pub common: Common,
}

impl Section for Worker {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("threads", |s| &s.threads, |s| &mut s.threads);
        fields.extends(|s| &s.common, |s| &mut s.common);
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct NodeSettings {
    pub label: String,
    pub replicas: u8,
}

impl Section for NodeSettings {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("label", |s| &s.label, |s| &mut s.label);
        fields.field("replicas", |s| &s.replicas, |s| &mut s.replicas);
    }
}

/// Builds its nested section from the enclosing instance.
#[derive(Debug, Default, PartialEq)]
pub struct Cluster {
    pub name: String,
    pub node: Option<NodeSettings>,
}

impl Section for Cluster {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("name", |s| &s.name, |s| &mut s.name);
        fields.optional_section_with(
            "node",
            |s| &s.node,
            |s| &mut s.node,
            |cluster| NodeSettings {
                label: format!("{}-node", cluster.name),
                replicas: 1,
            },
        );
    }
}

/// Two identifiers that collide once normalized.
#[derive(Debug, Default)]
pub struct Clashing {
    pub first: u8,
    pub second: u8,
}

impl Section for Clashing {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("hostName", |s| &s.first, |s| &mut s.first);
        fields
            .field("other", |s| &s.second, |s| &mut s.second)
            .path("Host-Name");
    }
}

impl Convert for Clashing {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::section::<Self>()
    }
}

/// Reaches a broken section only through an optional field.
#[derive(Debug, Default)]
pub struct Gateway {
    pub name: String,
    pub fallback: Option<Clashing>,
}

impl Section for Gateway {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("name", |s| &s.name, |s| &mut s.name);
        fields.optional_section("fallback", |s| &s.fallback, |s| &mut s.fallback);
    }
}

/// Reaches a broken section only through a list.
#[derive(Debug, Default)]
pub struct Fleet {
    pub members: Vec<Clashing>,
}

impl Section for Fleet {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("members", |s| &s.members, |s| &mut s.members);
    }
}

/// A section that contains itself through a list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Category {
    pub label: String,
    pub children: Vec<Category>,
}

impl Section for Category {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("label", |s| &s.label, |s| &mut s.label);
        fields.field("children", |s| &s.children, |s| &mut s.children);
    }
}

impl Convert for Category {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::section::<Self>()
    }
}

/// A list element whose setter rejects out-of-range values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Share {
    pub percent: u32,
}

impl Section for Share {
    fn describe(fields: &mut Fields<Self>) {
        fields.property("percent", |s| s.percent, Share::set_percent);
    }
}

impl Share {
    pub fn set_percent(&mut self, percent: u32) -> Result<(), String> {
        if percent > 100 {
            return Err(format!("{percent}% is more than the whole"));
        }
        self.percent = percent;
        Ok(())
    }
}

impl Convert for Share {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::section::<Self>()
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Split {
    pub shares: Vec<Share>,
}

impl Section for Split {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("shares", |s| &s.shares, |s| &mut s.shares);
    }
}

/// Has no converter unless a test registers one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Secret(pub String);

impl Convert for Secret {}

#[derive(Debug, Default, PartialEq)]
pub struct Credentials {
    pub user: String,
    pub secret: Secret,
    pub port: u16,
}

impl Section for Credentials {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("user", |s| &s.user, |s| &mut s.user);
        fields.field("secret", |s| &s.secret, |s| &mut s.secret);
        fields.field("port", |s| &s.port, |s| &mut s.port);
    }
}
