//! Fixture diffs - small, hand-written inputs covering one shape each

/// One modified file with a single hunk
pub fn modified_file() -> &'static str {
    "diff --git a/x.ts b/x.ts
index 83db48f..bf269f4 100644
--- a/x.ts
+++ b/x.ts
@@ -1,2 +1,3 @@
 context
-old
+new1
+new2
"
}

pub fn added_file() -> &'static str {
    "diff --git a/src/new.rs b/src/new.rs
new file mode 100644
index 0000000..e69de29
--- /dev/null
+++ b/src/new.rs
@@ -0,0 +1,3 @@
+pub fn hello() {
+    println!(\"hello\");
+}
"
}

pub fn deleted_file() -> &'static str {
    "diff --git a/src/old.rs b/src/old.rs
deleted file mode 100644
index e69de29..0000000
--- a/src/old.rs
+++ /dev/null
@@ -1,2 +0,0 @@
-pub fn goodbye() {}
-
"
}

/// Rename with no content change
pub fn pure_rename() -> &'static str {
    "diff --git a/lib/util.rs b/lib/helpers.rs
similarity index 100%
rename from lib/util.rs
rename to lib/helpers.rs
"
}

/// Rename with an edit, followed by a file that reuses the old path
pub fn rename_then_reuse() -> &'static str {
    "diff --git a/api/client.ts b/api/http.ts
similarity index 92%
rename from api/client.ts
rename to api/http.ts
index 1111111..2222222 100644
--- a/api/client.ts
+++ b/api/http.ts
@@ -3,3 +3,3 @@ import { fetch } from './fetch';
 export class Client {
-  base = '/v1';
+  base = '/v2';
 }
diff --git a/api/client.ts b/api/client.ts
new file mode 100644
index 0000000..3333333
--- /dev/null
+++ b/api/client.ts
@@ -0,0 +1 @@
+export { Client } from './http';
"
}

pub fn binary_file() -> &'static str {
    "diff --git a/assets/logo.png b/assets/logo.png
index 5f2b1c0..9a8e7d6 100644
Binary files a/assets/logo.png and b/assets/logo.png differ
"
}

/// Missing trailing newline on both sides
pub fn no_newline_at_eof() -> &'static str {
    "diff --git a/VERSION b/VERSION
index 0d4c1e2..8a1f3b7 100644
--- a/VERSION
+++ b/VERSION
@@ -1 +1 @@
-1.0.0
\\ No newline at end of file
+1.1.0
\\ No newline at end of file
"
}

/// A malformed hunk header sandwiched between two good files
pub fn malformed_middle() -> &'static str {
    "diff --git a/a.txt b/a.txt
--- a/a.txt
+++ b/a.txt
@@ -1 +1 @@
-a
+A
diff --git a/b.txt b/b.txt
--- a/b.txt
+++ b/b.txt
@@ -one +1 @@
-b
+B
diff --git a/c.txt b/c.txt
--- a/c.txt
+++ b/c.txt
@@ -1 +1 @@
-c
+C
"
}

/// Several shapes in one diff, in the order git would print them
pub fn mixed() -> String {
    [
        modified_file(),
        added_file(),
        deleted_file(),
        pure_rename(),
        binary_file(),
        no_newline_at_eof(),
    ]
    .concat()
}

/// `git diff --name-status` output matching [`mixed`]
pub fn mixed_name_status() -> &'static str {
    "M\tx.ts
A\tsrc/new.rs
D\tsrc/old.rs
R100\tlib/util.rs\tlib/helpers.rs
M\tassets/logo.png
M\tVERSION
"
}
