use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

/// Swift and Objective-C module imports.
pub struct SwiftPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?m)^\s*import\s+(Foundation|UIKit|SwiftUI|Combine|AppKit)\s*$", 35),
        (r"(?m)^\s*(public\s+|private\s+)?func\s+\w+\s*(<[^>]*>)?\(", 15),
        (r"\b(let|var)\s+\w+\s*:\s*[A-Z]\w*[?!]?", 15),
        (r"\bguard\s+let\b", 15),
        (r"(?m)^\s*(struct|class|enum|protocol|extension)\s+\w+\s*:\s*\w+", 10),
        (r"(?m)^\s*@(main|objc|State|Published|IBOutlet)\b", 15),
        (r"(?m)^\s*#import\s+[<\x22]", 20),
        (r"@interface\s+\w+", 20),
    ])
});

static IMPORT: Lazy<Option<Regex>> = Lazy::new(|| {
    pattern(r"(?m)^\s*(?:@testable\s+|@_exported\s+)?import\s+(?:(?:class|struct|enum|protocol|func|typealias|var|let)\s+)?([A-Za-z_]\w*)")
});
static OBJC_IMPORT: Lazy<Option<Regex>> = Lazy::new(|| pattern(r"(?m)^\s*@import\s+([A-Za-z_]\w*)"));

const APPLE_FRAMEWORKS: &[&str] = &[
    "Foundation", "UIKit", "SwiftUI", "Combine", "AppKit", "CoreData", "CoreGraphics",
    "CoreLocation", "CoreImage", "CoreML", "CoreMotion", "CoreBluetooth", "CoreFoundation",
    "QuartzCore", "AVFoundation", "AVKit", "MapKit", "WebKit", "StoreKit", "GameKit",
    "SpriteKit", "SceneKit", "Metal", "MetalKit", "ARKit", "RealityKit", "HealthKit",
    "CloudKit", "Contacts", "Photos", "PhotosUI", "UserNotifications", "Security",
    "LocalAuthentication", "Network", "OSLog", "os", "Darwin", "Glibc", "Dispatch",
    "XCTest", "Swift", "ObjectiveC", "Accelerate", "CryptoKit", "Vision", "NaturalLanguage",
    "WidgetKit", "AppIntents", "Observation", "SwiftData", "Charts", "Cocoa", "System",
];

/// Module names and the Git repository that ships them.
const KNOWN: &[(&str, &str)] = &[
    ("Alamofire", "github.com/Alamofire/Alamofire"),
    ("Kingfisher", "github.com/onevcat/Kingfisher"),
    ("SnapKit", "github.com/SnapKit/SnapKit"),
    ("RxSwift", "github.com/ReactiveX/RxSwift"),
    ("RxCocoa", "github.com/ReactiveX/RxSwift"),
    ("SwiftyJSON", "github.com/SwiftyJSON/SwiftyJSON"),
    ("Vapor", "github.com/vapor/vapor"),
    ("Fluent", "github.com/vapor/fluent"),
    ("NIO", "github.com/apple/swift-nio"),
    ("NIOHTTP1", "github.com/apple/swift-nio"),
    ("Logging", "github.com/apple/swift-log"),
    ("ArgumentParser", "github.com/apple/swift-argument-parser"),
    ("Collections", "github.com/apple/swift-collections"),
    ("Algorithms", "github.com/apple/swift-algorithms"),
    ("Crypto", "github.com/apple/swift-crypto"),
    ("ComposableArchitecture", "github.com/pointfreeco/swift-composable-architecture"),
    ("Dependencies", "github.com/pointfreeco/swift-dependencies"),
    ("SnapshotTesting", "github.com/pointfreeco/swift-snapshot-testing"),
    ("Quick", "github.com/Quick/Quick"),
    ("Nimble", "github.com/Quick/Nimble"),
    ("Realm", "github.com/realm/realm-swift"),
    ("RealmSwift", "github.com/realm/realm-swift"),
    ("GRDB", "github.com/groue/GRDB.swift"),
    ("KeychainAccess", "github.com/kishikawakatsumi/KeychainAccess"),
    ("Lottie", "github.com/airbnb/lottie-ios"),
    ("SDWebImage", "github.com/SDWebImage/SDWebImage"),
    ("Moya", "github.com/Moya/Moya"),
    ("PromiseKit", "github.com/mxcl/PromiseKit"),
    ("FirebaseCore", "github.com/firebase/firebase-ios-sdk"),
    ("FirebaseAuth", "github.com/firebase/firebase-ios-sdk"),
    ("FirebaseFirestore", "github.com/firebase/firebase-ios-sdk"),
];

impl LanguagePlugin for SwiftPlugin {
    fn id(&self) -> &'static str {
        "swift"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".swift", ".m", ".mm"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        let mut imports = super::capture_modules(&IMPORT, content);
        imports.extend(super::capture_modules(&OBJC_IMPORT, content));
        imports
    }

    fn is_std_lib(&self, module: &str) -> bool {
        APPLE_FRAMEWORKS.contains(&module)
    }

    /// SwiftPM packages are addressed by repository URL, which only a known
    /// table can supply.
    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        KNOWN
            .iter()
            .find(|(name, _)| *name == module)
            .map(|(_, repo)| DetectedPackage::new(Ecosystem::Swift, *repo))
    }
}
