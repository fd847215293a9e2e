//! Minimal IOKit/CoreFoundation bindings for reading properties of the main
//! display's service node.

#![allow(non_camel_case_types, non_upper_case_globals)]

use std::ffi::{c_char, c_void, CString};
use std::ptr;

use crate::errors::{ProbeError, ProbeResult};
use crate::gpu::PropertyValue;

type CFTypeRef = *const c_void;
type CFStringRef = *const c_void;
type CFAllocatorRef = *const c_void;
type CFTypeID = usize;
type CFIndex = isize;
type Boolean = u8;
type io_registry_entry_t = u32;
type CGDirectDisplayID = u32;

const kCFStringEncodingUTF8: u32 = 0x0800_0100;
const kCFNumberSInt64Type: CFIndex = 4;
const kIORegistryIterateRecursively: u32 = 0x1;
const kIORegistryIterateParents: u32 = 0x2;
const kIOServicePlane: &[u8] = b"IOService\0";

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    fn CFStringCreateWithCString(
        alloc: CFAllocatorRef,
        c_str: *const c_char,
        encoding: u32,
    ) -> CFStringRef;
    fn CFGetTypeID(cf: CFTypeRef) -> CFTypeID;
    fn CFNumberGetTypeID() -> CFTypeID;
    fn CFDataGetTypeID() -> CFTypeID;
    fn CFStringGetTypeID() -> CFTypeID;
    fn CFNumberGetValue(number: CFTypeRef, the_type: CFIndex, value_ptr: *mut c_void) -> Boolean;
    fn CFDataGetLength(data: CFTypeRef) -> CFIndex;
    fn CFDataGetBytePtr(data: CFTypeRef) -> *const u8;
    fn CFStringGetLength(s: CFStringRef) -> CFIndex;
    fn CFStringGetMaximumSizeForEncoding(length: CFIndex, encoding: u32) -> CFIndex;
    fn CFStringGetCString(
        s: CFStringRef,
        buffer: *mut c_char,
        size: CFIndex,
        encoding: u32,
    ) -> Boolean;
    fn CFRelease(cf: CFTypeRef);
}

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    fn IORegistryEntrySearchCFProperty(
        entry: io_registry_entry_t,
        plane: *const c_char,
        key: CFStringRef,
        allocator: CFAllocatorRef,
        options: u32,
    ) -> CFTypeRef;
}

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGMainDisplayID() -> CGDirectDisplayID;
    fn CGDisplayIOServicePort(display: CGDirectDisplayID) -> io_registry_entry_t;
}

/// Owned CoreFoundation reference, released on drop.
struct CfRef(CFTypeRef);

impl Drop for CfRef {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { CFRelease(self.0) };
        }
    }
}

/// Service port of the main display. Owned by the system, not released.
pub fn main_display_service() -> ProbeResult<io_registry_entry_t> {
    let port = unsafe { CGDisplayIOServicePort(CGMainDisplayID()) };
    if port == 0 {
        return Err(ProbeError::Unavailable);
    }
    Ok(port)
}

/// Look `name` up on `service` and, failing that, its parents.
pub fn search_property(service: io_registry_entry_t, name: &str) -> ProbeResult<PropertyValue> {
    let cname = CString::new(name).map_err(|e| ProbeError::failed("iokit", e))?;
    let key = CfRef(unsafe {
        CFStringCreateWithCString(ptr::null(), cname.as_ptr(), kCFStringEncodingUTF8)
    });
    if key.0.is_null() {
        return Err(ProbeError::failed("iokit", format!("CFString for {name}")));
    }

    let value = CfRef(unsafe {
        IORegistryEntrySearchCFProperty(
            service,
            kIOServicePlane.as_ptr() as *const c_char,
            key.0,
            ptr::null(),
            kIORegistryIterateRecursively | kIORegistryIterateParents,
        )
    });
    if value.0.is_null() {
        return Err(ProbeError::failed("iokit", format!("{name} not found")));
    }

    let ty = unsafe { CFGetTypeID(value.0) };
    if ty == unsafe { CFNumberGetTypeID() } {
        let mut n: i64 = 0;
        let ok = unsafe {
            CFNumberGetValue(value.0, kCFNumberSInt64Type, &mut n as *mut i64 as *mut c_void)
        };
        if ok == 0 {
            return Err(ProbeError::failed("iokit", format!("{name}: lossy number")));
        }
        Ok(PropertyValue::Number(n))
    } else if ty == unsafe { CFDataGetTypeID() } {
        let bytes = unsafe {
            let len = CFDataGetLength(value.0).max(0) as usize;
            let p = CFDataGetBytePtr(value.0);
            if p.is_null() || len == 0 {
                Vec::new()
            } else {
                std::slice::from_raw_parts(p, len).to_vec()
            }
        };
        Ok(PropertyValue::Data(bytes))
    } else if ty == unsafe { CFStringGetTypeID() } {
        cf_string(value.0)
            .map(PropertyValue::Text)
            .ok_or_else(|| ProbeError::failed("iokit", format!("{name}: bad string")))
    } else {
        Err(ProbeError::failed("iokit", format!("{name}: unsupported type")))
    }
}

fn cf_string(s: CFStringRef) -> Option<String> {
    unsafe {
        let len = CFStringGetLength(s);
        let cap = CFStringGetMaximumSizeForEncoding(len, kCFStringEncodingUTF8) + 1;
        let mut buf = vec![0u8; cap.max(1) as usize];
        if CFStringGetCString(s, buf.as_mut_ptr() as *mut c_char, cap, kCFStringEncodingUTF8) == 0 {
            return None;
        }
        let end = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
        Some(String::from_utf8_lossy(&buf[..end]).into_owned())
    }
}
