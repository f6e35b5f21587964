use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket as StdUdpSocket};
use socket2::{Domain, Protocol, Socket, Type};

/// Creates and configures the UDP socket the tuner streams into.
/// Handles both unicast and multicast addresses
pub fn create_udp_socket(addr: SocketAddr, recv_buffer_size: Option<usize>) -> io::Result<Socket> {
    let ip = match addr.ip() {
        IpAddr::V4(v4) => v4,
        _ => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "only IPv4 is supported",
            ))
        }
    };

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    if let Some(size) = recv_buffer_size {
        socket.set_recv_buffer_size(size)?;
    }
    socket.bind(&addr.into())?;

    // Join multicast group if the address is multicast
    if ip.is_multicast() {
        let iface = Ipv4Addr::UNSPECIFIED; // default interface
        socket.join_multicast_v4(&ip, &iface)?;
    }

    socket.set_nonblocking(true)?;
    Ok(socket)
}

/// Local address the OS would use to reach `device`.
/// Connecting a UDP socket sends nothing; it only resolves the route.
pub fn local_ip_towards(device: SocketAddr) -> io::Result<IpAddr> {
    let probe = StdUdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    probe.connect(device)?;
    Ok(probe.local_addr()?.ip())
}

/// Endpoint the tuner should stream to: routed local IP plus the bound port
pub fn destination_endpoint(device: SocketAddr, bound: SocketAddr) -> io::Result<SocketAddr> {
    if !bound.ip().is_unspecified() {
        return Ok(bound);
    }
    Ok(SocketAddr::new(local_ip_towards(device)?, bound.port()))
}
