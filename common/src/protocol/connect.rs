/// First command on a new connection
#[derive(Debug, Clone, PartialEq, pylon_derive::Codec)]
pub struct Connect {
    pub client_version: String,
    pub protocol_version: u32,
    /// keepalive(ms)
    pub keepalive: u32,
}

#[derive(Debug, Clone, PartialEq, pylon_derive::Codec)]
pub struct Connected {
    pub server_version: String,
    pub protocol_version: u32,
}
