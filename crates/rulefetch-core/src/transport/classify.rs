//! Classify curl errors into transport error kinds.

use super::TransportErrorKind;

/// Map a libcurl error code onto the tag the retry engine switches on.
pub fn classify_curl_error(e: &curl::Error) -> TransportErrorKind {
    if e.is_aborted_by_callback() {
        return TransportErrorKind::Abort;
    }
    if e.is_url_malformed() || e.is_unsupported_protocol() {
        return TransportErrorKind::Escaping;
    }
    if e.is_operation_timedout() {
        return TransportErrorKind::Timeout;
    }
    if e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
        return TransportErrorKind::Dns;
    }
    if e.is_couldnt_connect() {
        return TransportErrorKind::ConnRefused;
    }
    if e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return TransportErrorKind::ConnReset;
    }
    if e.is_ssl_connect_error() || e.is_peer_failed_verification() || e.is_ssl_cacert() {
        return TransportErrorKind::Tls;
    }
    TransportErrorKind::Other
}
