#![allow(non_snake_case)]

use std::io::BufReader;

use crate::net::config::RouterConfig;

#[test]
fn Parse_IfaceAndRouteLines_PopulatesBothTables() {
    // Arrange
    let text = "\
iface eth0 00:00:00:00:00:01 10.0.0.1
iface eth1 00:00:00:00:00:02 192.168.0.1
route 0.0.0.0 0.0.0.0 10.0.0.254 eth0
";

    // Act
    let config = RouterConfig::parse(BufReader::new(text.as_bytes())).unwrap();

    // Assert
    assert!(config.interfaces.get("eth0").is_some());
    assert!(config.interfaces.get("eth1").is_some());
    assert!(config.routes.longest_prefix_match([8, 8, 8, 8]).is_some());
}

#[test]
fn Parse_SkipsBlankAndCommentLines() {
    // Arrange
    let text = "\n# a comment\niface eth0 00:00:00:00:00:01 10.0.0.1\n";

    // Act
    let config = RouterConfig::parse(BufReader::new(text.as_bytes())).unwrap();

    // Assert
    assert!(config.interfaces.get("eth0").is_some());
}

#[test]
fn Parse_RouteReferencingUnknownInterface_ReturnsError() {
    // Arrange
    let text = "route 0.0.0.0 0.0.0.0 10.0.0.254 eth9\n";

    // Act
    let result = RouterConfig::parse(BufReader::new(text.as_bytes()));

    // Assert
    assert!(result.is_err());
}

#[test]
fn Parse_MalformedIfaceLine_ReturnsError() {
    // Arrange: missing the ipv4 field
    let text = "iface eth0 00:00:00:00:00:01\n";

    // Act
    let result = RouterConfig::parse(BufReader::new(text.as_bytes()));

    // Assert
    assert!(result.is_err());
}

#[test]
fn Parse_InvalidMacAddress_ReturnsError() {
    // Arrange
    let text = "iface eth0 not-a-mac 10.0.0.1\n";

    // Act
    let result = RouterConfig::parse(BufReader::new(text.as_bytes()));

    // Assert
    assert!(result.is_err());
}
