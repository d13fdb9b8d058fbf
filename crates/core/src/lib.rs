pub mod audit;
pub mod auth;
pub mod cache;
pub mod cloudconvert;
pub mod config;
pub mod conversion;
pub mod credits;
pub mod metrics;
pub mod paths;
pub mod testing;

pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditEventEnvelope, AuditFilter, AuditHandle,
    AuditRecord, AuditSink, AuditStore, AuditWriter, NoopAuditSink, SqliteAuditStore,
};
pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, NoneAuthenticator, Principal,
};
pub use cache::{CacheEntry, CacheError, ContentCache, FsContentCache};
pub use cloudconvert::{
    AccountInfo, ClientError, CloudConvertClient, CloudConvertConfig, ConversionClient,
    ImportMethod, RemoteJob, ResultStream,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, CacheConfig, Config,
    ConfigError, SanitizedConfig,
};
pub use conversion::{
    ConversionOptions, ConversionOrchestrator, ConversionOutcome, ConversionRequest,
    ConversionRequestBuilder, ConvertError, ConvertedArtifact,
};
pub use credits::{
    credit_alert, AlertLevel, CreditAlert, CreditCheck, CreditMonitor, CreditMonitorConfig,
    CreditNotifier, LogNotifier,
};
pub use paths::PathResolver;
