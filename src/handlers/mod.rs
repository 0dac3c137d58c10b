pub mod auth_handlers;
pub mod control_handlers;
pub mod live_handlers;

use std::net::{IpAddr, Ipv4Addr};

use actix_web::HttpRequest;

/// Client IP for rate limiting; unspecified when the transport hides it.
pub(crate) fn peer_ip(req: &HttpRequest) -> IpAddr {
    req.peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}
