//! Windows Portable Devices property keys and content types
//!
//! Process-wide constants; nothing here is mutable or initialized at runtime.

use windows::core::GUID;
use windows::Win32::UI::Shell::PropertiesSystem::PROPERTYKEY;

/// Property set shared by the common object properties
const WPD_OBJECT_PROPERTIES_V1: GUID = GUID::from_u128(0xef6b490d_5cd8_437a_affc_da8b60ee4a3c);

const fn object_key(pid: u32) -> PROPERTYKEY {
    PROPERTYKEY {
        fmtid: WPD_OBJECT_PROPERTIES_V1,
        pid,
    }
}

pub const WPD_OBJECT_PARENT_ID: PROPERTYKEY = object_key(3);
pub const WPD_OBJECT_NAME: PROPERTYKEY = object_key(4);
pub const WPD_OBJECT_CONTENT_TYPE: PROPERTYKEY = object_key(7);
pub const WPD_OBJECT_SIZE: PROPERTYKEY = object_key(11);
pub const WPD_OBJECT_ORIGINAL_FILE_NAME: PROPERTYKEY = object_key(12);
pub const WPD_OBJECT_DATE_CREATED: PROPERTYKEY = object_key(18);
pub const WPD_OBJECT_DATE_MODIFIED: PROPERTYKEY = object_key(19);

/// Default data stream of an object
pub const WPD_RESOURCE_DEFAULT: PROPERTYKEY = PROPERTYKEY {
    fmtid: GUID::from_u128(0xe81e79be_34f0_41bf_b53f_f1a06ae87842),
    pid: 0,
};

/// Content type of a plain folder
pub const WPD_CONTENT_TYPE_FOLDER: GUID = GUID::from_u128(0x27e2e392_a111_48e0_ab0c_e17705a05f85);

/// Content type of storage roots such as "Internal Storage"
pub const WPD_CONTENT_TYPE_FUNCTIONAL_OBJECT: GUID =
    GUID::from_u128(0x99ed0160_17ff_4c44_9d98_1d7a6f941921);

/// Every property read when listing an object
pub const OBJECT_PROPERTY_KEYS: [PROPERTYKEY; 7] = [
    WPD_OBJECT_PARENT_ID,
    WPD_OBJECT_NAME,
    WPD_OBJECT_ORIGINAL_FILE_NAME,
    WPD_OBJECT_CONTENT_TYPE,
    WPD_OBJECT_SIZE,
    WPD_OBJECT_DATE_CREATED,
    WPD_OBJECT_DATE_MODIFIED,
];

/// Whether objects of this content type contain other objects
pub fn is_container(content_type: &GUID) -> bool {
    *content_type == WPD_CONTENT_TYPE_FOLDER || *content_type == WPD_CONTENT_TYPE_FUNCTIONAL_OBJECT
}
