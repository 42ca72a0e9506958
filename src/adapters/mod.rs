//! Adapters — concrete implementations of the collaborator port traits.
//!
//! | Adapter    | Implements         | Connects to                    |
//! |------------|--------------------|--------------------------------|
//! | `host_fs`  | FileSystem         | `std::fs` (simulation)         |
//! | `host_net` | NetStack           | `std::net::TcpStream` (sim)    |
//! | `lwip`     | NetStack           | lwIP sockets (ESP-IDF)         |
//! | `nvs_fs`   | FileSystem         | NVS `certs` namespace (ESP-IDF)|
//! | `mbedtls`  | CredentialParser   | mbedTLS x509/pk + BIO hooks    |

#[cfg(not(target_os = "espidf"))]
pub mod host_fs;
#[cfg(not(target_os = "espidf"))]
pub mod host_net;
#[cfg(target_os = "espidf")]
pub mod lwip;
#[cfg(target_os = "espidf")]
pub mod mbedtls;
pub mod nvs_fs;
