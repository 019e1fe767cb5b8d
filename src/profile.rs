//! PBAP profile values.
//!
//! Constants that turn a generic OBEX session into a Phone Book Access
//! session, and the object names a client can pull.

use std::fmt;

/// Target UUID identifying the PBAP service.
pub const PBAP_TARGET: [u8; 16] = [
    0x79, 0x61, 0x35, 0xF0, 0xF0, 0xC5, 0x11, 0xD8, 0x09, 0x66, 0x08, 0x00, 0x20, 0x0C, 0x9A, 0x66,
];

/// Object type for a pull of a whole phone-book object.
pub const PHONEBOOK_TYPE: &str = "x-bt/phonebook";

/// OBEX protocol version 1.0.
pub const OBEX_VERSION: u8 = 0x10;

/// Connect flags; none are defined for clients.
pub const CONNECT_FLAGS: u8 = 0x00;

/// Maximum packet size announced on connect.
pub const DEFAULT_MAX_PACKET_SIZE: u16 = 0x0FA0;

/// Where a phone-book object is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Repository {
    /// The phone's own memory.
    #[default]
    Phone,
    /// The first SIM card.
    Sim1,
}

impl Repository {
    fn prefix(self) -> &'static str {
        match self {
            Self::Phone => "",
            Self::Sim1 => "SIM1/",
        }
    }
}

/// Phone-book folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Folder {
    /// Main phone book (`pb`).
    #[default]
    Phonebook,
    /// Incoming call history (`ich`).
    IncomingCalls,
    /// Outgoing call history (`och`).
    OutgoingCalls,
    /// Missed call history (`mch`).
    MissedCalls,
    /// Combined call history (`cch`).
    CombinedCalls,
    /// Speed dial entries (`spd`).
    SpeedDial,
    /// Favorite contacts (`fav`).
    Favorites,
}

impl Folder {
    /// Short folder name used in object paths.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Phonebook => "pb",
            Self::IncomingCalls => "ich",
            Self::OutgoingCalls => "och",
            Self::MissedCalls => "mch",
            Self::CombinedCalls => "cch",
            Self::SpeedDial => "spd",
            Self::Favorites => "fav",
        }
    }

    /// Parse a short folder name such as `pb` or `mch`.
    pub fn from_name(name: &str) -> Option<Self> {
        [
            Self::Phonebook,
            Self::IncomingCalls,
            Self::OutgoingCalls,
            Self::MissedCalls,
            Self::CombinedCalls,
            Self::SpeedDial,
            Self::Favorites,
        ]
        .into_iter()
        .find(|folder| folder.as_str() == name)
    }
}

/// A phone-book object addressable by a pull request.
///
/// Renders to the object name sent in the `Name` header, e.g.
/// `telecom/pb.vcf` or `SIM1/telecom/mch.vcf`.
///
/// ```
/// use obex_pbap::{Folder, PhonebookObject, Repository};
///
/// let object = PhonebookObject::new(Repository::Sim1, Folder::MissedCalls);
/// assert_eq!(object.name(), "SIM1/telecom/mch.vcf");
/// assert_eq!(PhonebookObject::default().name(), "telecom/pb.vcf");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PhonebookObject {
    pub repository: Repository,
    pub folder: Folder,
}

impl PhonebookObject {
    pub fn new(repository: Repository, folder: Folder) -> Self {
        Self { repository, folder }
    }

    /// Object in the phone's own memory.
    pub fn phone(folder: Folder) -> Self {
        Self::new(Repository::Phone, folder)
    }

    /// Object on the SIM card.
    pub fn sim(folder: Folder) -> Self {
        Self::new(Repository::Sim1, folder)
    }

    /// Object name for the `Name` header.
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PhonebookObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}telecom/{}.vcf",
            self.repository.prefix(),
            self.folder.as_str()
        )
    }
}
